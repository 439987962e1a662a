use multiworld_game::PlayerId;
use thiserror::Error;

use crate::options::OptionError;

/// Fatal generation failures. Plugins and stages return these through `anyhow`, and callers
/// recover the kind with `downcast_ref::<GenerationError>()`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("player {player} ({name}): {message}")]
    Configuration {
        player: PlayerId,
        name: String,
        message: String,
    },

    #[error("player {player} ({name}) has invalid options:\n{}", format_option_errors(.errors))]
    InvalidOptions {
        player: PlayerId,
        name: String,
        errors: Vec<OptionError>,
    },

    #[error("{game}: {message}")]
    Invariant { game: String, message: String },

    #[error("item pool has {items} items but there are {locations} unfilled locations ({breakdown})")]
    CountMismatch {
        items: usize,
        locations: usize,
        breakdown: String,
    },

    #[error("player {player} ({name}) needs filler items, but no participant can supply them")]
    NoFillerSource { player: PlayerId, name: String },

    #[error(
        "[{stage}] no valid placement for items [{}]; locations left unfilled [{}]",
        join_names(.unplaced_items),
        join_names(.unfilled_locations)
    )]
    FillInfeasible {
        stage: String,
        unplaced_items: Vec<String>,
        unfilled_locations: Vec<String>,
    },

    #[error("completion condition unreachable for: {}", join_names(.players))]
    Unbeatable { players: Vec<String> },

    #[error("{} participants have problems:\n{}", .failures.len(), format_failures(.failures))]
    InvalidPlayers { failures: Vec<GenerationError> },
}

fn format_failures(failures: &[GenerationError]) -> String {
    failures
        .iter()
        .map(|e| format!("- {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_option_errors(errors: &[OptionError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}
