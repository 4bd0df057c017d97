pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标保持双精度。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }
}

pub mod group_code {
    use std::fmt;

    /// 扫描器关心的 DXF 组码。
    ///
    /// 文本 DXF 中组码单独占一行并右对齐，因此两位数组码前总有一个空格，
    /// 扫描时以 `" 10"` 这样的字面量定位。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum GroupCode {
        /// 10：起点 / 圆心 X
        PrimaryX,
        /// 20：起点 / 圆心 Y
        PrimaryY,
        /// 11：终点 X
        SecondaryX,
        /// 21：终点 Y
        SecondaryY,
        /// 40：半径
        Radius,
        /// 50：起始角
        StartAngle,
        /// 51：终止角
        EndAngle,
    }

    impl GroupCode {
        #[inline]
        pub fn code(self) -> u16 {
            match self {
                GroupCode::PrimaryX => 10,
                GroupCode::PrimaryY => 20,
                GroupCode::SecondaryX => 11,
                GroupCode::SecondaryY => 21,
                GroupCode::Radius => 40,
                GroupCode::StartAngle => 50,
                GroupCode::EndAngle => 51,
            }
        }

        /// 带前导空格的查找标记。
        #[inline]
        pub fn marker(self) -> &'static str {
            match self {
                GroupCode::PrimaryX => " 10",
                GroupCode::PrimaryY => " 20",
                GroupCode::SecondaryX => " 11",
                GroupCode::SecondaryY => " 21",
                GroupCode::Radius => " 40",
                GroupCode::StartAngle => " 50",
                GroupCode::EndAngle => " 51",
            }
        }
    }

    impl fmt::Display for GroupCode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.code())
        }
    }
}

pub mod number {
    /// `%g` 的有效数字位数。
    const SIGNIFICANT_DIGITS: i32 = 6;

    /// 按 C `printf("%g")` 的规则格式化浮点数：保留 6 位有效数字，去掉
    /// 末尾的 0 和小数点；十进制指数小于 -4 或不小于 6 时改用科学计数法，
    /// 指数带符号且至少两位（`1e-07`、`1.23457e+06`）。
    pub fn fmt_general(value: f64) -> String {
        if value.is_nan() {
            return if value.is_sign_negative() { "-nan" } else { "nan" }.to_string();
        }
        if value.is_infinite() {
            return if value < 0.0 { "-inf" } else { "inf" }.to_string();
        }
        if value == 0.0 {
            return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
        }

        // 先按 6 位有效数字舍入，再由舍入后的指数决定记数法
        let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
        let Some((mantissa, exponent)) = scientific.split_once('e') else {
            return value.to_string();
        };
        let Ok(exponent) = exponent.parse::<i32>() else {
            return value.to_string();
        };

        if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!(
                "{}e{}{:02}",
                trim_fraction(mantissa),
                sign,
                exponent.unsigned_abs()
            )
        } else {
            let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
            trim_fraction(&format!("{value:.decimals$}")).to_string()
        }
    }

    fn trim_fraction(text: &str) -> &str {
        if text.contains('.') {
            text.trim_end_matches('0').trim_end_matches('.')
        } else {
            text
        }
    }

}

pub mod entity {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;
    use crate::group_code::GroupCode;
    use crate::number::fmt_general;

    const LINE_FIELDS: [GroupCode; 4] = [
        GroupCode::PrimaryX,
        GroupCode::PrimaryY,
        GroupCode::SecondaryX,
        GroupCode::SecondaryY,
    ];

    const ARC_FIELDS: [GroupCode; 5] = [
        GroupCode::PrimaryX,
        GroupCode::PrimaryY,
        GroupCode::Radius,
        GroupCode::StartAngle,
        GroupCode::EndAngle,
    ];

    /// 支持的实体类型。每种类型对应一个文本标记和一组按固定顺序出现的组码。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EntityKind {
        Line,
        Arc,
    }

    impl EntityKind {
        pub const ALL: [EntityKind; 2] = [EntityKind::Line, EntityKind::Arc];

        #[inline]
        pub fn marker(self) -> &'static str {
            match self {
                EntityKind::Line => "LINE",
                EntityKind::Arc => "ARC",
            }
        }

        /// 解码时依次要求的组码，顺序即文件中的出现顺序。
        #[inline]
        pub fn fields(self) -> &'static [GroupCode] {
            match self {
                EntityKind::Line => &LINE_FIELDS,
                EntityKind::Arc => &ARC_FIELDS,
            }
        }

        /// 由按 [`EntityKind::fields`] 顺序收集到的数值构造实体。
        ///
        /// 数值个数不符时返回 `None`。
        pub fn build(self, values: &[f64]) -> Option<Entity> {
            match (self, values) {
                (EntityKind::Line, &[x1, y1, x2, y2]) => Some(Entity::Line(Line {
                    start: Point2::new(x1, y1),
                    end: Point2::new(x2, y2),
                })),
                (EntityKind::Arc, &[cx, cy, radius, start_angle, end_angle]) => {
                    Some(Entity::Arc(Arc {
                        center: Point2::new(cx, cy),
                        radius,
                        start_angle,
                        end_angle,
                    }))
                }
                _ => None,
            }
        }
    }

    impl fmt::Display for EntityKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.marker())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Arc(Arc),
    }

    impl Entity {
        #[inline]
        pub fn kind(&self) -> EntityKind {
            match self {
                Entity::Line(_) => EntityKind::Line,
                Entity::Arc(_) => EntityKind::Arc,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
    }

    /// 圆弧实体，角度保持文件中的单位（度），不做换算。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
    }

    /// 输出报告行。浮点数按 `%g` 格式化（`1`、`2.5`、`1.23457e+06`）。
    impl fmt::Display for Entity {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Entity::Line(line) => write!(
                    f,
                    "Found line segment from ({},{}) to ({},{})",
                    fmt_general(line.start.x()),
                    fmt_general(line.start.y()),
                    fmt_general(line.end.x()),
                    fmt_general(line.end.y())
                ),
                Entity::Arc(arc) => write!(
                    f,
                    "Found arc center ({},{}) radius {} from {}° to {}°.",
                    fmt_general(arc.center.x()),
                    fmt_general(arc.center.y()),
                    fmt_general(arc.radius),
                    fmt_general(arc.start_angle),
                    fmt_general(arc.end_angle)
                ),
            }
        }
    }

}
