pub mod point_reader;
pub use point_reader::PointReader;
pub mod solution_writer;
pub use solution_writer::SolutionWriter;

pub mod report;
pub use report::TimingReport;
