mod session_error_tests;
