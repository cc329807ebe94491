//! Page arrangement flags shared by merge and compress

use anyhow::{bail, Context, Result};
use pdfkaro_core::{EntryId, PdfRenderer, ToolPage};
use tracing::debug;

#[derive(clap::Args, Debug, Default, Clone)]
pub struct Arrange {
    /// Move the page at position FROM to position TO (1-based), e.g. `--move 4:1`
    #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
    pub moves: Vec<(usize, usize)>,

    /// Rotate the page at this position a quarter turn clockwise; repeatable
    #[arg(long, value_name = "POS")]
    pub rotate: Vec<usize>,

    /// Drop the page at this position (positions are read after moves)
    #[arg(long, value_name = "POS")]
    pub remove: Vec<usize>,
}

fn parse_move(raw: &str) -> Result<(usize, usize), String> {
    let (from, to) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{}'", raw))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| format!("'{}' is not a position", s.trim()))
    };
    Ok((parse(from)?, parse(to)?))
}

/// 1-based position to zero-based index
fn index(position: usize, len: usize) -> Result<usize> {
    if position == 0 || position > len {
        bail!("Position {} is out of range (1-{})", position, len);
    }
    Ok(position - 1)
}

impl Arrange {
    /// Apply moves, then rotations, then removals
    pub fn apply<R: PdfRenderer>(&self, page: &mut ToolPage<R>) -> Result<()> {
        for &(from, to) in &self.moves {
            let len = page.pages().len();
            page.move_entry(index(from, len)?, index(to, len)?)
                .with_context(|| format!("Cannot move page {} to {}", from, to))?;
            debug!(from, to, "moved");
        }

        for &position in &self.rotate {
            let id = entry_at(page, position)?;
            page.rotate(id)?;
        }

        let doomed = self
            .remove
            .iter()
            .map(|&position| entry_at(page, position))
            .collect::<Result<Vec<_>>>()?;
        for id in doomed {
            // Repeated positions name the same entry
            if page.pages().get(id).is_some() {
                page.remove(id)?;
            }
        }
        Ok(())
    }
}

fn entry_at<R: PdfRenderer>(page: &ToolPage<R>, position: usize) -> Result<EntryId> {
    let slice = page.pages().as_slice();
    Ok(slice[index(position, slice.len())?].id)
}
