mod birthday;
mod info;
mod ping;
mod santa;
mod setup;
mod shutdown;

use birthday::*;
use info::*;
use ping::*;
use poise::Command;
use santa::*;
use setup::*;
use shutdown::*;

use crate::structs::{Data, Error};

pub fn get_commands() -> Vec<Command<Data, Error>> {
    vec![setup(), ping(), info(), shutdown(), birthday(), santa()]
}
