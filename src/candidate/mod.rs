//! Candidate selection for score surfaces.
//!
//! Top-K collection and spatial non-maximum suppression, used when a detector
//! needs every instance of its indicator rather than a yes/no answer.

pub(crate) mod nms;
pub(crate) mod topk;
