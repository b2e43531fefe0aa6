pub mod dadjokes;
pub mod formdata;
pub mod hw;
pub mod mini_insta;
pub mod quiz1;
pub mod quotes;
pub mod restaurant;
pub mod runtracker;
pub mod voter_analytics;
