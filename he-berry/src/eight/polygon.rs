use crate::Idx2d;
use ordered_float::OrderedFloat;

/// 以 Bresenham 算法绘制 `(h0, w0)` 到 `(h1, w1)` 的 8-连通线段 (含端点).
/// 只对位于 `shape` 内部的像素调用 `put`.
pub fn draw_line<F: FnMut(Idx2d)>(
    (h0, w0): (i64, i64),
    (h1, w1): (i64, i64),
    (height, width): Idx2d,
    mut put: F,
) {
    let (dh, dw) = ((h1 - h0).abs(), -(w1 - w0).abs());
    let (sh, sw) = (if h0 < h1 { 1 } else { -1 }, if w0 < w1 { 1 } else { -1 });
    let (mut h, mut w) = (h0, w0);
    let mut err = dh + dw;
    loop {
        if (0..height as i64).contains(&h) && (0..width as i64).contains(&w) {
            put((h as usize, w as usize));
        }
        if h == h1 && w == w1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dw {
            err += dw;
            h += sh;
        }
        if e2 <= dh {
            err += dh;
            w += sw;
        }
    }
}

/// 光栅化闭合多边形 `vertices` (每个顶点为 `(高, 宽)`), 包括其边界.
///
/// 内部采用非零环绕规则: 每条扫描线 `y` 与满足 `min(y0, y1) <= y < max(y0, y1)`
/// 的边求交, 环绕数非零的区间被填充. 因此自相交或来回重叠的边
/// (例如轮廓跟踪得到的单像素宽 "桥") 不会在内部挖出空洞.
///
/// 顶点少于 3 个时只绘制边界.
pub fn fill_polygon<F: FnMut(Idx2d)>(vertices: &[(i64, i64)], shape: Idx2d, mut put: F) {
    let n = vertices.len();
    if n == 0 {
        return;
    }
    for i in 0..n {
        draw_line(vertices[i], vertices[(i + 1) % n], shape, &mut put);
    }
    if n < 3 {
        return;
    }

    let (height, width) = shape;
    if height == 0 || width == 0 {
        return;
    }
    let y_min = vertices.iter().map(|v| v.0).min().unwrap_or(0).max(0);
    let y_max = vertices
        .iter()
        .map(|v| v.0)
        .max()
        .unwrap_or(0)
        .min(height as i64 - 1);

    let mut crossings: Vec<(OrderedFloat<f64>, i32)> = Vec::with_capacity(8);
    for y in y_min..=y_max {
        crossings.clear();
        for i in 0..n {
            let (y0, x0) = vertices[i];
            let (y1, x1) = vertices[(i + 1) % n];
            if y0 == y1 || y < y0.min(y1) || y >= y0.max(y1) {
                continue;
            }
            let x = x0 as f64 + (y - y0) as f64 * (x1 - x0) as f64 / (y1 - y0) as f64;
            let dir = if y1 > y0 { 1 } else { -1 };
            crossings.push((OrderedFloat(x), dir));
        }
        crossings.sort_unstable();

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            let left = pair[0].0.ceil().max(0.0);
            let right = pair[1].0.floor().min(width as f64 - 1.0);
            if left > right {
                continue;
            }
            for x in left as usize..=right as usize {
                put((y as usize, x));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn raster(vertices: &[(i64, i64)], shape: Idx2d) -> Array2<u8> {
        let mut a = Array2::zeros(shape);
        fill_polygon(vertices, shape, |p| a[p] = 1);
        a
    }

    #[test]
    fn test_line() {
        let mut v = Vec::new();
        draw_line((0, 0), (2, 4), (5, 5), |p| v.push(p));
        assert_eq!(v.first(), Some(&(0, 0)));
        assert_eq!(v.last(), Some(&(2, 4)));
        assert_eq!(v.len(), 5);

        // 越界部分被裁剪.
        let mut v = Vec::new();
        draw_line((-2, 0), (2, 0), (2, 2), |p| v.push(p));
        assert_eq!(v, vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_fill_rectangle_inclusive() {
        let a = raster(&[(1, 1), (1, 4), (3, 4), (3, 1)], (5, 6));
        assert_eq!(a.sum(), 3 * 4);
        assert_eq!(a[(2, 2)], 1);
        assert_eq!(a[(0, 0)], 0);
        assert_eq!(a[(4, 5)], 0);
    }

    #[test]
    fn test_fill_triangle_and_degenerate() {
        let a = raster(&[(0, 0), (4, 0), (4, 4)], (5, 5));
        // 包含对角线的下三角.
        assert_eq!(a.sum(), 15);
        assert_eq!(a[(1, 3)], 0);

        let b = raster(&[(2, 1), (2, 3)], (5, 5));
        assert_eq!(b.sum(), 3);
    }

    #[test]
    fn test_fill_clipped() {
        let a = raster(&[(-3, -3), (-3, 10), (10, 10), (10, -3)], (4, 4));
        assert_eq!(a.sum(), 16);
    }
}
