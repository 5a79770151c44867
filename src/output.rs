use crate::align::bounded::structs::{CloudBoundGroup, RowBounds, Seed};
use crate::structs::dp_matrix::DpMatrixDense;
use crate::structs::profile::Special;
use crate::structs::Alignment;

use std::collections::HashMap;
use std::io::Write;

use anyhow::Context;

/// Alignment seeds keyed by profile name, the JSON-persisted handoff
/// between an external seeder and the engine.
pub type SeedMap = HashMap<String, Vec<Seed>>;

pub fn write_seeds(seed_map: &SeedMap, out: &mut impl Write) -> anyhow::Result<()> {
    let json = serde_json::to_string(seed_map).context("failed to serialize alignment seeds")?;
    write!(out, "{json}").context("failed to write alignment seeds")?;
    Ok(())
}

pub fn read_seeds(input: &str) -> anyhow::Result<SeedMap> {
    serde_json::from_str(input).context("failed to parse alignment seeds")
}

/// One text line per bound: `diag\t<d>\t<lb>\t<rb>`.
pub fn write_diag_bounds(bounds: &CloudBoundGroup, out: &mut impl Write) -> anyhow::Result<()> {
    for bound in &bounds.bounds {
        writeln!(out, "diag\t{}\t{}\t{}", bound.line, bound.lb, bound.rb)?;
    }
    Ok(())
}

/// One text line per interval: `row\t<i>\t<lb>\t<rb>`.
pub fn write_row_bounds(bounds: &RowBounds, out: &mut impl Write) -> anyhow::Result<()> {
    for row in 0..=bounds.target_length {
        for interval in bounds.row(row) {
            writeln!(out, "row\t{}\t{}\t{}", row, interval.lb, interval.rb)?;
        }
    }
    Ok(())
}

/// Labelled dump of a dense DP matrix: one `M`/`I`/`D` row per query
/// position, then a special-states block.
pub fn write_dp_matrix(mx: &DpMatrixDense, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "##### DP MATRIX #####")?;
    writeln!(out, "DIM\t{}\t{}", mx.target_length, mx.profile_length)?;

    writeln!(out, "##### NORMAL STATES #####")?;
    for row in 0..=mx.target_length {
        write!(out, "M {row}")?;
        for col in 0..=mx.profile_length {
            write!(out, "\t{:.3}", mx.get_match(row, col))?;
        }
        writeln!(out)?;

        write!(out, "I {row}")?;
        for col in 0..=mx.profile_length {
            write!(out, "\t{:.3}", mx.get_insert(row, col))?;
        }
        writeln!(out)?;

        write!(out, "D {row}")?;
        for col in 0..=mx.profile_length {
            write!(out, "\t{:.3}", mx.get_delete(row, col))?;
        }
        writeln!(out)?;
    }

    writeln!(out, "##### SPECIAL STATES #####")?;
    for (label, special) in [
        ("N", Special::N),
        ("J", Special::J),
        ("E", Special::E),
        ("C", Special::C),
        ("B", Special::B),
    ] {
        write!(out, "{label}")?;
        for row in 0..=mx.target_length {
            write!(out, "\t{:.3}", mx.get_special(special, row))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Tab-separated results table, one line per alignment.
pub fn write_tabular_output(alignments: &[Alignment], out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(
        out,
        "# query\ttarget\tqstart\tqend\ttstart\ttend\tscore\tevalue"
    )?;
    for alignment in alignments {
        writeln!(out, "{}", alignment.tab_string())?;
    }
    Ok(())
}
