pub mod fake_driver;
