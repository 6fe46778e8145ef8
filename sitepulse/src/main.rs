use sitepulse::{command_argument_builder, handle_loadtest, handle_scrape};

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    match chosen_command.subcommand() {
        Some(("scrape", primary_command)) => handle_scrape(primary_command, quiet, verbose).await,
        Some(("loadtest", primary_command)) => {
            handle_loadtest(primary_command, quiet, verbose).await
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
