use crate::Idx2d;

/// Moore 邻域的 8 个方向 (高, 宽), 从正西开始按顺时针排列.
const DIRS: [(isize, isize); 8] = [
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
];

#[inline]
fn step((h, w): Idx2d, d: usize) -> Idx2d {
    let (dh, dw) = DIRS[d];
    (h.wrapping_add_signed(dh), w.wrapping_add_signed(dw))
}

/// `to` 相对于 `from` 的方向下标. 二者必须 8-相邻.
#[inline]
fn direction(from: Idx2d, to: Idx2d) -> usize {
    let diff = (
        to.0.wrapping_sub(from.0) as isize,
        to.1.wrapping_sub(from.1) as isize,
    );
    DIRS.iter()
        .position(|d| *d == diff)
        .unwrap_or_else(|| unreachable!("{from:?} and {to:?} are not 8-adjacent"))
}

/// 从 `start` 出发, 用 Moore 邻域跟踪 (Jacob 停止准则) 获取其所在 8-连通区域的外轮廓.
///
/// 返回首尾 8-相邻的顺时针像素链, 起点为 `start`, 不重复包含终点.
/// 一个像素可能在链中出现多次 (例如单像素宽的 "桥").
/// 孤立像素返回 `[start]`.
///
/// # 注意
///
/// 1. `inside(p)` 判断 `p` 是否属于该区域, 越界索引 (含回绕后的巨大索引) 必须返回 `false`.
/// 2. `start` 必须是该区域行优先顺序的第一个像素, 否则得到的可能不是外轮廓.
pub fn trace_outer_contour<F>(start: Idx2d, mut inside: F) -> Vec<Idx2d>
where
    F: FnMut(Idx2d) -> bool,
{
    debug_assert!(inside(start));
    let mut contour = vec![start];
    let mut cur = start;
    // 回溯点方向. 起点的西侧一定不属于区域.
    let mut back = 0usize;
    let mut first_move: Option<usize> = None;

    loop {
        let Some((d, k)) = (1..=8)
            .map(|k| ((back + k) % 8, k))
            .find(|&(d, _)| inside(step(cur, d)))
        else {
            // 孤立像素
            break;
        };

        if cur == start {
            match first_move {
                None => first_move = Some(d),
                Some(fd) if fd == d => break,
                _ => {}
            }
        }

        let checked = step(cur, (back + k - 1) % 8);
        let next = step(cur, d);
        back = direction(next, checked);
        cur = next;
        contour.push(cur);
    }

    if contour.len() > 1 && contour.last() == Some(&start) {
        contour.pop();
    }
    contour
}

#[cfg(test)]
mod tests {
    use super::trace_outer_contour;
    use crate::Idx2d;
    use ndarray::{array, Array2};

    fn trace(a: &Array2<u8>) -> Vec<Idx2d> {
        let start = a
            .indexed_iter()
            .find_map(|(p, v)| (*v != 0).then_some(p))
            .unwrap();
        trace_outer_contour(start, |p| matches!(a.get(p), Some(&v) if v != 0))
    }

    #[test]
    fn test_isolated_pixel() {
        let a = array![[0, 0, 0], [0, 1, 0], [0, 0, 0]];
        assert_eq!(trace(&a), vec![(1, 1)]);
    }

    #[test]
    fn test_square_clockwise() {
        let a = Array2::from_elem((3, 3), 1u8);
        assert_eq!(
            trace(&a),
            vec![(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)]
        );
    }

    #[test]
    fn test_ring_ignores_hole() {
        let mut a = Array2::from_elem((5, 5), 1u8);
        a[(2, 2)] = 0;
        let c = trace(&a);
        assert_eq!(c.len(), 16);
        assert!(!c.contains(&(1, 1)));
        assert!(c.iter().all(|&(h, w)| h == 0 || h == 4 || w == 0 || w == 4));
    }

    #[test]
    fn test_line_goes_back_and_forth() {
        let a = array![[1, 1, 1, 1]];
        assert_eq!(trace(&a), vec![(0, 0), (0, 1), (0, 2), (0, 3), (0, 2), (0, 1)]);
    }

    #[test]
    fn test_diagonal_and_closed() {
        let a = array![[1, 0, 0], [0, 1, 0], [0, 0, 1]];
        let c = trace(&a);
        assert_eq!(c, vec![(0, 0), (1, 1), (2, 2), (1, 1)]);

        // 首尾 8-相邻.
        let a = array![[0, 1, 1, 0], [1, 1, 1, 1], [0, 1, 1, 0]];
        let c = trace(&a);
        let (f, l) = (c[0], *c.last().unwrap());
        assert!(f.0.abs_diff(l.0) <= 1 && f.1.abs_diff(l.1) <= 1);
        assert_eq!(c.len(), 6);
        assert!(!c.contains(&(1, 1)));
    }
}
