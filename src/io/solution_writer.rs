use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use itertools::Itertools;

use crate::utils::Solution;

/// Writes `<cost> <1|0>` with five decimals (1 iff the solution is optimal), followed by a line
/// with the space separated point ids in visiting order.
pub trait SolutionWriter {
    fn try_write_solution<W: Write>(&self, writer: W) -> std::io::Result<()>;
    fn try_write_solution_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()>;
}

impl SolutionWriter for Solution {
    fn try_write_solution<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{:.5} {}", self.cost, self.exact as u8)?;
        writeln!(writer, "{}", self.tour.ids().iter().join(" "))?;
        writer.flush()
    }

    fn try_write_solution_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        self.try_write_solution(writer)
    }
}
