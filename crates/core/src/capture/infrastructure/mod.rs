pub mod channel_photo_acquirer;
pub mod log_guidance_sink;
