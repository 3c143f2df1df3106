#![allow(dead_code)]

pub mod vod_server;
