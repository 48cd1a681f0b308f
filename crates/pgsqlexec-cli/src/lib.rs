mod cli;
mod config;
mod logging;
mod run_cmd;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Run(args) => {
            logging::init(args.verbose);
            run_cmd::run(args).await
        }
    }
}
