pub mod alignment;
pub mod dp_matrix;
pub mod hmm;
pub mod profile;
pub mod sequence;
pub mod trace;

pub use alignment::Alignment;
pub use dp_matrix::DpMatrixDense;
pub use hmm::Hmm;
pub use profile::Profile;
pub use sequence::Sequence;
pub use trace::Trace;
