use crate::error::PatchGrabError;
use dialoguer::{Input, MultiSelect};

const VERSIONS_PER_PAGE: usize = 20;

pub fn ask_directory(message: &str, initial: &str) -> Result<String, PatchGrabError> {
    let answer = Input::<String>::new()
        .with_prompt(message)
        .default(initial.to_string())
        .interact_text()?;
    Ok(answer)
}

pub fn ask_versions(versions: &[String]) -> Result<Vec<String>, PatchGrabError> {
    let picked = MultiSelect::new()
        .with_prompt("Pick the versions you want to download")
        .items(versions)
        .max_length(VERSIONS_PER_PAGE)
        .interact()?;

    Ok(picked
        .into_iter()
        .map(|index| versions[index].clone())
        .collect())
}
