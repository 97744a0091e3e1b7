mod cleanup_tests;
mod signer_tests;
