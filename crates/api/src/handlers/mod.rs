pub mod chat;
pub mod exercises;
pub mod feedback;
pub mod frame_check;
