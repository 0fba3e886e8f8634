mod list;
mod remove;
mod set;
mod show;

use list::list;
use remove::remove;
use set::set;
use show::show;

use crate::structs::{Context, Error};

/// Birthday tracking and announcements
#[poise::command(slash_command, guild_only, subcommands("set", "remove", "show", "list"))]
pub async fn birthday(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub fn number(self) -> u32 {
        self as u32 + 1
    }
}

/// "Monday" … "Sunday" for the engine's Monday-based index.
fn weekday_name(index: u32) -> &'static str {
    match index {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_are_one_based() {
        assert_eq!(Month::January.number(), 1);
        assert_eq!(Month::February.number(), 2);
        assert_eq!(Month::December.number(), 12);
    }

    #[test]
    fn weekday_names_start_on_monday() {
        assert_eq!(weekday_name(0), "Monday");
        assert_eq!(weekday_name(6), "Sunday");
    }
}
