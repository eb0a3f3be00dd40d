pub(crate) mod config;
pub(crate) mod init;
pub(crate) mod playback;
pub(crate) mod series;
