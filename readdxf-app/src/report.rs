use std::io::{self, Write};

use readdxf_core::entity::Entity;

/// 逐条写出实体报告行，返回写出的条数。
///
/// 每条实体解出后立即写出；`out` 为行缓冲时调用方无需额外刷新。
pub fn write_entities<W, I>(out: &mut W, entities: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Entity>,
{
    let mut count = 0;
    for entity in entities {
        writeln!(out, "{entity}")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
