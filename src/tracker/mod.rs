pub mod visit_tracker;
