#![allow(dead_code)]

pub mod upload_server;
