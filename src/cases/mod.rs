//! Test cases shipped with the harness.
//!
//! Every module here is named `test_*` and registers its case with
//! [`register_test_case!`](logprobe_harness::register_test_case), so the
//! runner finds them without a list.

pub mod test_feed;
pub mod test_input_drivers;
pub mod test_lua_config;

pub use test_feed::TestFeed;
pub use test_input_drivers::TestInputDrivers;
pub use test_lua_config::TestLuaConfig;
