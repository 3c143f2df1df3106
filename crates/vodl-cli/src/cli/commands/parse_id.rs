//! `vodl parse-id` – print the numeric id of a video URL.

use anyhow::{bail, Result};
use vodl_core::video::parse_video_id;

pub fn run_parse_id(input: &str) -> Result<()> {
    match parse_video_id(input) {
        Some(id) => {
            println!("{}", id);
            Ok(())
        }
        None => bail!("'{}' is not a video id or video url", input),
    }
}
