fn main() {
    use infragraph::cli::parse;
    let cli = parse();
    infragraph::app::init_tracing(cli.verbose, cli.quiet);
    let code = infragraph::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
