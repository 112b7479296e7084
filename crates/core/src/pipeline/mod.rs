pub mod capture_session_use_case;
pub mod capture_target;
pub mod classification_dispatcher;
pub mod frame_sampler;
pub mod infrastructure;
pub mod session_logger;
