//! Unit tests for the API client building blocks.
