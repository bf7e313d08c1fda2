pub mod approve_part_request_command;
pub mod reject_part_request_command;
pub mod submit_part_request_command;

pub use approve_part_request_command::ApprovePartRequestCommand;
pub use reject_part_request_command::RejectPartRequestCommand;
pub use submit_part_request_command::{PartRequestView, SubmitPartRequestCommand};
