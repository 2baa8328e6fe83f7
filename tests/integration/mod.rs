/// Integration tests against on-disk databases
mod basic_integration;
mod lifecycle_tests;
mod repository_tests;
