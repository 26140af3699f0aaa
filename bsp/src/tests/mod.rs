mod bsp_tests;
