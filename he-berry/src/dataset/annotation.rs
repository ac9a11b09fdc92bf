//! 多边形真值标注 (XML) 的解析与光栅化.
//!
//! 文件中每个 `Region` 元素描述一个细胞核, 可带有预先计算好的 `Area` 属性,
//! 其 `Vertex` 子元素按顺序给出多边形顶点, `X` 为列坐标, `Y` 为行坐标.

use crate::data::LabelMap;
use crate::eight::fill_polygon;
use crate::error::AnnotationError;
use crate::Idx2d;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// 一个标注区域.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotatedRegion {
    /// 标注文件给出的面积.
    pub area: Option<f64>,
    /// 顶点 `(x, y)`, 即 (列, 行).
    pub vertices: Vec<(f64, f64)>,
}

impl AnnotatedRegion {
    /// 由顶点按鞋带公式计算的多边形面积 (绝对值).
    pub fn shoelace_area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|k| {
                let (x0, y0) = self.vertices[k];
                let (x1, y1) = self.vertices[(k + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        twice.abs() / 2.0
    }

    /// 顶点数不少于 3 且面积不为 0 (顶点不全共线) 时才构成多边形.
    #[inline]
    pub fn is_polygon(&self) -> bool {
        self.vertices.len() >= 3 && self.shoelace_area() > DEGENERATE_AREA
    }
}

/// 面积不超过该值的多边形视为退化.
const DEGENERATE_AREA: f64 = 1e-9;

/// 一张图像的全部标注区域, 保持文件中的顺序.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    /// 全部区域, 包括顶点数不足的区域.
    pub regions: Vec<AnnotatedRegion>,
}

fn parse_number(raw: &str, attr: &'static str) -> Result<f64, AnnotationError> {
    raw.trim()
        .parse()
        .map_err(|_| AnnotationError::BadNumber(attr, raw.to_owned()))
}

/// 读取元素 `e` 的数值属性 `attr`. 属性不存在时返回 `Ok(None)`.
fn number_attr(e: &BytesStart, attr: &'static str) -> Result<Option<f64>, AnnotationError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.as_ref() == attr.as_bytes() {
            let raw = a.unescape_value()?;
            return parse_number(&raw, attr).map(Some);
        }
    }
    Ok(None)
}

impl Annotation {
    /// 从 XML 文本解析.
    pub fn parse(xml: &str) -> Result<Self, AnnotationError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut regions = Vec::new();
        let mut current: Option<AnnotatedRegion> = None;
        loop {
            match reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"Region" => {
                    current = Some(AnnotatedRegion {
                        area: number_attr(&e, "Area")?,
                        vertices: Vec::new(),
                    });
                }
                Event::Empty(e) if e.name().as_ref() == b"Region" => {
                    regions.push(AnnotatedRegion {
                        area: number_attr(&e, "Area")?,
                        vertices: Vec::new(),
                    });
                }
                Event::End(e) if e.name().as_ref() == b"Region" => {
                    regions.extend(current.take());
                }
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Vertex" => {
                    if let Some(region) = current.as_mut() {
                        let x = number_attr(&e, "X")?.ok_or(AnnotationError::MissingCoordinate("X"))?;
                        let y = number_attr(&e, "Y")?.ok_or(AnnotationError::MissingCoordinate("Y"))?;
                        region.vertices.push((x, y));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(Self { regions })
    }

    /// 读取并解析标注文件.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnnotationError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// 构成多边形的区域.
    pub fn polygons(&self) -> impl Iterator<Item = &AnnotatedRegion> {
        self.regions.iter().filter(|r| r.is_polygon())
    }

    /// 多边形区域的标注面积, 与 [`Annotation::to_label_map`] 的标签顺序一致.
    /// 任一多边形缺少面积属性时返回 `None`.
    pub fn polygon_areas(&self) -> Option<Vec<f64>> {
        self.polygons().map(|r| r.area).collect()
    }

    /// 光栅化为标签图. 第 `k` 个多边形区域 (从 1 开始) 的标签为 `k`,
    /// 顶点坐标四舍五入到像素中心, 多边形边界计入区域. 重叠处后出现的区域覆盖先出现的.
    /// 顶点不足 3 个或面积为 0 的区域被跳过.
    pub fn to_label_map(&self, shape: Idx2d) -> LabelMap {
        let mut labels = LabelMap::background(shape);
        let skipped = self.regions.len() - self.polygons().count();
        if skipped > 0 {
            log::warn!("{skipped} degenerate annotated regions skipped");
        }
        for (k, region) in self.polygons().enumerate() {
            let label = k as u32 + 1;
            let vertices: Vec<(i64, i64)> = region
                .vertices
                .iter()
                .map(|&(x, y)| (y.round() as i64, x.round() as i64))
                .collect();
            fill_polygon(&vertices, shape, |p| labels[p] = label);
        }
        labels
    }
}
