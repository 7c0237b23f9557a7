//! Shared grammars and assertions for the integration tests.
