pub mod print_conf;
pub mod run_chain;
