mod ffprobe_info;
mod path_validator;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use path_validator::{ensure_directory_exists, validate_directory_exists};
pub use video_scanner::{VideoFileInfo, scan_video_files};
