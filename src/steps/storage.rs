//! The storage step vocabulary.

use crate::client::ResourceKind;
use crate::error::PhraseError;

use super::StepKeyword::{Given, Then, When};
use super::{StepRegistry, assertions};

const NAME: &str = "name";

impl StepRegistry {
    /// The full folder, file, trash, and shared-link vocabulary.
    ///
    /// Composite givens are sequences of the single-call primitives on
    /// [`super::ScenarioContext`].
    ///
    /// # Errors
    ///
    /// Returns `PhraseError` if a phrase fails to compile.
    pub fn storage() -> Result<Self, PhraseError> {
        Self::builder()
            // Folders.
            .with(
                When,
                "I create a folder with the name {name} in the base directory",
                |ctx, args| ctx.create_folder_in_base(args.get(NAME)?),
            )
            .with(
                Given,
                "I have a folder with the name {name} in the base directory",
                |ctx, args| ctx.create_folder_in_base(args.get(NAME)?),
            )
            .with(
                Given,
                "I have a folder with the name {name} in the trash",
                |ctx, args| {
                    ctx.create_folder_in_base(args.get(NAME)?)?;
                    ctx.trash_subject_folder()
                },
            )
            .with(
                Given,
                "I have a folder named {name} in that directory",
                |ctx, args| ctx.create_folder_in_subject(args.get(NAME)?),
            )
            .with(When, "I get information about the folder", |ctx, _| {
                ctx.get_subject_folder()
            })
            .with(When, "I set the folder's name to {name}", |ctx, args| {
                ctx.rename_subject_folder(args.get(NAME)?)
            })
            .with(
                When,
                "I copy that folder to the base directory with the name {name}",
                |ctx, args| ctx.copy_subject_folder_to_base(args.get(NAME)?),
            )
            .with(When, "I get the items in the folder", |ctx, _| {
                ctx.get_subject_folder_items()
            })
            // Shared links.
            .with(When, "I create a shared link for that folder", |ctx, _| {
                ctx.share_subject_folder()
            })
            .with(Given, "that folder has a shared link", |ctx, _| {
                ctx.share_subject_folder()
            })
            .with(When, "I delete a shared link for that folder", |ctx, _| {
                ctx.unshare_subject_folder()
            })
            // Trash.
            .with(When, "I get the contents of the trash", |ctx, _| {
                ctx.get_trash()
            })
            .with(When, "I delete that folder permanently", |ctx, _| {
                ctx.purge_subject_folder()
            })
            .with(
                When,
                "I restore that folder to the base directory as {name}",
                |ctx, args| ctx.restore_subject_folder(args.get(NAME)?),
            )
            // Files.
            .with(Given, "I have a local file named {name}", |ctx, args| {
                ctx.write_local_file(args.get(NAME)?)
            })
            .with(When, "I upload the file named {name}", |ctx, args| {
                ctx.upload_local_file(args.get(NAME)?)
            })
            .with(
                Given,
                "I have a remote file named {name} in the base directory",
                |ctx, args| {
                    let name = args.get(NAME)?;
                    ctx.write_local_file(name)?;
                    ctx.upload_local_file(name)
                },
            )
            .with(When, "I get information about the file", |ctx, _| {
                ctx.get_subject_file()
            })
            .with(When, "I set the file's name to {name}", |ctx, args| {
                ctx.rename_subject_file(args.get(NAME)?)
            })
            .with(When, "I lock the file", |ctx, _| ctx.lock_subject_file())
            .with(Given, "the file is locked", |ctx, _| ctx.lock_subject_file())
            .with(When, "I unlock the file", |ctx, _| ctx.unlock_subject_file())
            // Postconditions.
            .with(Then, "the folder should be created", |ctx, _| {
                let result = ctx.require_result("the folder should be created")?;
                Ok(assertions::expect_kind(result, ResourceKind::Folder)?)
            })
            .with(
                Then,
                "I should receive information about a folder named {name} in the base directory",
                |ctx, args| {
                    let base = ctx.base_id()?;
                    let result = ctx.require_result("receive information about a folder")?;
                    Ok(assertions::expect_named_in(result, args.get(NAME)?, &base)?)
                },
            )
            .with(
                Then,
                "I should receive information about a file named {name} in the base directory",
                |ctx, args| {
                    let base = ctx.base_id()?;
                    let result = ctx.require_result("receive information about a file")?;
                    Ok(assertions::expect_named_in(result, args.get(NAME)?, &base)?)
                },
            )
            .with(Then, "the folder should have a shared link", |ctx, _| {
                let result = ctx.require_result("the folder should have a shared link")?;
                Ok(assertions::expect_shared_link(result, true)?)
            })
            .with(Then, "the folder should have no shared link", |ctx, _| {
                let result = ctx.require_result("the folder should have no shared link")?;
                Ok(assertions::expect_shared_link(result, false)?)
            })
            .with(
                Then,
                "I should receive a list of items containing the folder {name}",
                |ctx, args| {
                    let result = ctx.require_result("a list of items containing the folder")?;
                    Ok(assertions::expect_listing_contains(result, args.get(NAME)?, true)?)
                },
            )
            .with(
                Then,
                "I should receive a list of items not containing the folder {name}",
                |ctx, args| {
                    let result = ctx.require_result("a list of items not containing the folder")?;
                    Ok(assertions::expect_listing_contains(result, args.get(NAME)?, false)?)
                },
            )
            .with(Then, "the file should be uploaded", |ctx, _| {
                let result = ctx.require_result("the file should be uploaded")?;
                Ok(assertions::expect_total_count(result, 1)?)
            })
            .with(Then, "the file should be locked", |ctx, _| {
                let result = ctx.require_result("the file should be locked")?;
                Ok(assertions::expect_locked(result, true)?)
            })
            .with(Then, "the file should be unlocked", |ctx, _| {
                let result = ctx.require_result("the file should be unlocked")?;
                Ok(assertions::expect_locked(result, false)?)
            })
            .build()
    }
}
