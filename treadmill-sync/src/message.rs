//! Commit message templates and the payload rewrite done by `--pick`.

use treadmill_core::Settings;

/// Marker line that starts the part of a treadmill payload worth keeping.
pub const CHANGES_MARKER: &str = "Changes as of";

/// Message for the throwaway commit that holds the vendor diff on the
/// treadmill branch. Never meant to be merged.
pub fn junk_commit_message(settings: &Settings, new_ref: &str) -> String {
    format!(
        "[DO NOT MERGE] vendor in {product} @ {new_ref}\n\
         \n\
         This is a JUNK COMMIT from {tool} v{version}.\n\
         \n\
         DO NOT MERGE! This is just a way to keep the {product}-podman\n\
         vendoring in sync. Refer to:\n\
         \n\
         \x20\x20\x20{title}\n",
        product = settings.product,
        tool = settings.tool_name,
        version = settings.tool_version,
        title = settings.treadmill_title,
    )
}

/// Header placed above the kept section of a picked payload.
pub fn pick_header(settings: &Settings, pr: u64) -> String {
    format!(
        "Vendor in latest {product}\n\
         \n\
         Cherry-picked by {tool} v{version} from the {product}\n\
         vendor treadmill PR, #{pr}. The changes below were needed\n\
         to keep podman building and passing tests against new {product}.",
        product = settings.product,
        tool = settings.tool_name,
        version = settings.tool_version,
    )
}

/// Everything from the first line beginning with [`CHANGES_MARKER`] to the
/// end, byte for byte.
pub fn changes_section(message: &str) -> Option<&str> {
    let mut offset = 0;
    for line in message.split_inclusive('\n') {
        if line.starts_with(CHANGES_MARKER) {
            return Some(&message[offset..]);
        }
        offset += line.len();
    }
    None
}

/// Drop the DO NOT MERGE preamble of a treadmill payload message and put
/// [`pick_header`] in its place. `None` when there is no changes section.
pub fn rewrite_payload_message(original: &str, settings: &Settings, pr: u64) -> Option<String> {
    let kept = changes_section(original)?;
    Some(format!("{}\n\n{kept}", pick_header(settings, pr)))
}
