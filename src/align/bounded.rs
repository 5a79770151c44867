pub mod backward_bounded;
pub mod cloud_search;
pub mod domains;
pub mod forward_bounded;
pub mod null2;
pub mod posterior;
pub mod structs;

pub use backward_bounded::backward_bounded;
pub use cloud_search::{cloud_search_backward, cloud_search_forward, CloudSearchScores};
pub use domains::{find_domains, DomainScore};
pub use forward_bounded::forward_bounded;
pub use null2::{null1_score, null2_score};
pub use posterior::posterior_bounded;
