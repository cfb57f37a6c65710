mod directory_tests;
