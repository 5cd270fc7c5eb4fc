pub mod comment_service;
pub mod comment_tree;
pub mod counters;
pub mod engagement;
pub mod follow_service;
pub mod post_service;
pub mod user_service;
