//! Line-oriented command language read from stdin.
//!
//! One command per line, words separated by whitespace. Blank lines and
//! lines starting with `#` are skipped. Holders are written `actor:N` or
//! `loc:N`; expiries use the compact forms (`n2`, `day3`, `forever`).
//!
//! ```text
//! ability 1 A1 prot 1/night
//! income 7 1 1
//! phase night
//! use 7 1 A1 guard the hall
//! knock 7 1 2 stealth
//! reply 3 open 8
//! resolve
//! ```

use std::str::FromStr;

use game_core::{
    AbilityError, AbilityKey, ActionId, ActorId, BlockSpan, Boundary, Category, CorrelationToken,
    Holder, Income, KnockRequest, KnockVerdict, LocationId, Modifiers, PhaseError, PhaseToken,
    Team, Until, VisitKind,
};
use runtime::Operation;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("{command}: missing <{argument}>")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("{command}: invalid <{argument}> '{value}'")]
    InvalidValue {
        command: String,
        argument: &'static str,
        value: String,
    },

    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Phase(#[from] PhaseError),
}

/// A parsed script line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptCommand {
    Apply(Operation),
    /// Print the queue in resolution order.
    Pending,
    /// Print a text summary of the session snapshot.
    State,
    /// Print the hex state root.
    Root,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  phase <token>                         advance to pregame|night|day|postgame
  next | reset                          cycle to the next phase | reset the counter
  ability <loc> <key> <category> [uses] assign an ability
  category <loc> <key> <category>       change an ability's category
  unassign <loc> <key>                  remove an ability
  team <loc> <team>                     set a location's team
  use <actor> <loc> <key> [text]        queue an ability use
  cancel <action>                       drop a pending action
  resolve | pending                     run the queue | show it
  grant|take <holder> <kind> <n>        adjust visits (holder: actor:N or loc:N)
  income <actor> <night> <day>          set visit income
  block <loc> <key> <until> [boundary]  block an ability
  visitblock <loc> <until> [boundary]   block visits to a location
  unblock <loc> <key> | visitunblock <loc>
  place <actor> <loc> | leave <actor>   move an actor | clear their location
  preset <loc> <text>                   save a preset (text may start with a key)
  presets <loc> [page] | ospreset       list one location's presets | every preset
  presetmove <loc> <from> <to>          reorder presets (1-based)
  presetremove <loc> <n>                delete a preset
  knock <actor> <from> <to> [stealth] [forced] [privileged]
  reply <ticket> open|refuse <responder>
  withdraw <ticket>                     cancel a pending knock
  state | root | help | quit";

struct Args<'a> {
    command: &'a str,
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn word(&mut self, argument: &'static str) -> Result<&'a str, ParseError> {
        self.words.next().ok_or_else(|| ParseError::MissingArgument {
            command: self.command.to_string(),
            argument,
        })
    }

    fn invalid(&self, argument: &'static str, value: &str) -> ParseError {
        ParseError::InvalidValue {
            command: self.command.to_string(),
            argument,
            value: value.to_string(),
        }
    }

    fn parse<T: FromStr>(&mut self, argument: &'static str) -> Result<T, ParseError> {
        let value = self.word(argument)?;
        value.parse().map_err(|_| self.invalid(argument, value))
    }

    fn actor(&mut self, argument: &'static str) -> Result<ActorId, ParseError> {
        self.parse(argument).map(ActorId)
    }

    fn location(&mut self, argument: &'static str) -> Result<LocationId, ParseError> {
        self.parse(argument).map(LocationId)
    }

    fn key(&mut self) -> Result<AbilityKey, ParseError> {
        Ok(AbilityKey::parse(self.word("key")?)?)
    }

    fn category(&mut self) -> Result<Category, ParseError> {
        Ok(Category::parse(self.word("category")?)?)
    }

    fn holder(&mut self) -> Result<Holder, ParseError> {
        let value = self.word("holder")?;
        let parsed = match value.split_once(':') {
            Some(("actor", id)) => id.parse().ok().map(|id| Holder::Actor(ActorId(id))),
            Some(("loc", id)) => id.parse().ok().map(|id| Holder::Location(LocationId(id))),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid("holder", value))
    }

    fn span(&mut self) -> Result<BlockSpan, ParseError> {
        let until = Until::parse(self.word("until")?);
        let boundary = match self.words.next() {
            Some(text) => text.parse().map_err(|_| self.invalid("boundary", text))?,
            None => Boundary::default(),
        };
        Ok(BlockSpan::new(until, boundary))
    }

    /// Remaining words joined by single spaces.
    fn rest(&mut self) -> String {
        self.words.by_ref().collect::<Vec<_>>().join(" ")
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.words.next() {
            Some(extra) => Err(self.invalid("end of line", extra)),
            None => Ok(()),
        }
    }
}

/// Parses one line; `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let mut args = Args { command, words };

    let parsed = match command.to_ascii_lowercase().as_str() {
        "phase" => {
            let target = PhaseToken::parse(args.word("token")?)?;
            args.finish()?;
            Operation::AdvancePhase { target }
        }
        "next" => {
            args.finish()?;
            Operation::NextPhase
        }
        "reset" => {
            args.finish()?;
            Operation::ResetPhaseCounter
        }
        "ability" => Operation::AssignAbility {
            location: args.location("loc")?,
            key: args.key()?,
            category: args.category()?,
            uses: args.rest(),
        },
        "category" => {
            let op = Operation::UpdateAbilityCategory {
                location: args.location("loc")?,
                key: args.key()?,
                category: args.category()?,
            };
            args.finish()?;
            op
        }
        "unassign" => {
            let op = Operation::RemoveAbility {
                location: args.location("loc")?,
                key: args.key()?,
            };
            args.finish()?;
            op
        }
        "team" => {
            let location = args.location("loc")?;
            let team = Team::new(args.word("team")?);
            args.finish()?;
            Operation::AssignTeam { location, team }
        }
        "use" => Operation::SubmitAction {
            actor: args.actor("actor")?,
            location: args.location("loc")?,
            key: args.key()?,
            description: args.rest(),
        },
        "cancel" => {
            let id = ActionId(args.parse("action")?);
            args.finish()?;
            Operation::CancelAction { id }
        }
        "resolve" => {
            args.finish()?;
            Operation::ResolveCycle
        }
        "grant" | "take" => {
            let holder = args.holder()?;
            let kind: VisitKind = args.parse("kind")?;
            let amount: u32 = args.parse("amount")?;
            args.finish()?;
            if command.eq_ignore_ascii_case("grant") {
                Operation::GrantVisits {
                    holder,
                    kind,
                    amount,
                }
            } else {
                Operation::RemoveVisits {
                    holder,
                    kind,
                    amount,
                }
            }
        }
        "income" => {
            let actor = args.actor("actor")?;
            let night = args.parse("night")?;
            let day = args.parse("day")?;
            args.finish()?;
            Operation::SetIncome {
                actor,
                income: Income::new(night, day),
            }
        }
        "block" => {
            let location = args.location("loc")?;
            let key = args.key()?;
            let span = args.span()?;
            args.finish()?;
            Operation::BlockAbility {
                location,
                key,
                span,
            }
        }
        "visitblock" => {
            let location = args.location("loc")?;
            let span = args.span()?;
            args.finish()?;
            Operation::BlockLocationVisits { location, span }
        }
        "unblock" => {
            let op = Operation::UnblockAbility {
                location: args.location("loc")?,
                key: args.key()?,
            };
            args.finish()?;
            op
        }
        "visitunblock" => {
            let location = args.location("loc")?;
            args.finish()?;
            Operation::UnblockLocationVisits { location }
        }
        "place" => {
            let op = Operation::PlaceActor {
                actor: args.actor("actor")?,
                location: args.location("loc")?,
            };
            args.finish()?;
            op
        }
        "leave" => {
            let actor = args.actor("actor")?;
            args.finish()?;
            Operation::RemoveActor { actor }
        }
        "preset" => {
            let location = args.location("loc")?;
            let text = args.rest();
            match text.to_ascii_lowercase().as_str() {
                "" => {
                    return Err(ParseError::MissingArgument {
                        command: command.to_string(),
                        argument: "text",
                    });
                }
                "list" | "show" => Operation::ListPresets { location, page: 1 },
                _ => Operation::AddPreset { location, text },
            }
        }
        "presets" => {
            let location = args.location("loc")?;
            let page = match args.words.next() {
                Some(value) => value.parse().map_err(|_| args.invalid("page", value))?,
                None => 1,
            };
            args.finish()?;
            Operation::ListPresets { location, page }
        }
        "ospreset" => {
            args.finish()?;
            Operation::AllPresets
        }
        "presetmove" => {
            let location = args.location("loc")?;
            let from = args.parse("from")?;
            let to = args.parse("to")?;
            args.finish()?;
            Operation::MovePreset { location, from, to }
        }
        "presetremove" => {
            let location = args.location("loc")?;
            let position = args.parse("n")?;
            args.finish()?;
            Operation::RemovePreset { location, position }
        }
        "knock" => {
            let actor = args.actor("actor")?;
            let origin = args.location("from")?;
            let target = args.location("to")?;
            let mut modifiers = Modifiers::empty();
            let mut privileged = false;
            let flags: Vec<&str> = args.words.by_ref().collect();
            for flag in flags {
                match flag.to_ascii_lowercase().as_str() {
                    "stealth" => modifiers |= Modifiers::STEALTH,
                    "forced" => modifiers |= Modifiers::FORCED,
                    "privileged" => privileged = true,
                    _ => return Err(args.invalid("flag", flag)),
                }
            }
            Operation::RequestKnock(KnockRequest {
                actor,
                origin,
                target,
                modifiers,
                privileged,
            })
        }
        "reply" => {
            let token = CorrelationToken(args.parse("ticket")?);
            let verdict: KnockVerdict = args.parse("verdict")?;
            let responder = args.actor("responder")?;
            args.finish()?;
            Operation::RespondKnock {
                token,
                verdict,
                responder,
            }
        }
        "withdraw" => {
            let token = CorrelationToken(args.parse("ticket")?);
            args.finish()?;
            Operation::CancelKnock { token }
        }
        "pending" => return args.finish().map(|()| Some(ScriptCommand::Pending)),
        "state" => return args.finish().map(|()| Some(ScriptCommand::State)),
        "root" => return args.finish().map(|()| Some(ScriptCommand::Root)),
        "help" => return Ok(Some(ScriptCommand::Help)),
        "quit" | "exit" => return Ok(Some(ScriptCommand::Quit)),
        _ => return Err(ParseError::UnknownCommand(command.to_string())),
    };

    Ok(Some(ScriptCommand::Apply(parsed)))
}
