use patchgrab_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_download, run_list};
use patchgrab_lib::error::PatchGrabError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), PatchGrabError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Download(params) => {
            run_download(params).await?;
        }
        ResolvedCommand::List(params) => {
            run_list(params).await?;
        }
    }

    Ok(())
}
