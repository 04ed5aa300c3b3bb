mod header_tests;
mod helpers;
mod message_tests;
