//! Line commands typed at the prompt.

use listen_core::{line_width_for, Msg, ParamValue};
use serde_json::Number;

pub const HELP: &str = "\
commands:
  set <field> <value...>   edit a field (several values make a list)
  unset <field>            clear a field
  extra <json>             replace the extra parameter object
  url <url>                edit the request URL in place
  import <json|url>        import a configuration
  reset | simplify         restore defaults | drop default-valued fields
  export | copy            print the JSON export | the request URL
  width <cols>             wrap the displayed URL at <cols> characters
  resize <px>              wrap for a container <px> pixels wide
  record on|off            toggle microphone transcription
  stream <file>            stream a file through the server
  stop                     stop recording or file streaming
  upload <file>            batch-transcribe a file
  detect                   ask the server for input device settings
  clear                    clear the transcript
  show | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Msg),
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let msg = match word {
        "" | "show" => return Ok(Command::Show),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "set" => {
            let mut parts = rest.split_whitespace();
            let name = parts.next().ok_or("usage: set <field> <value...>")?;
            let values: Vec<&str> = parts.collect();
            Msg::FieldEdited {
                name: name.to_string(),
                value: parse_value(&values),
            }
        }
        "unset" => Msg::FieldEdited {
            name: required(rest, "usage: unset <field>")?.to_string(),
            value: ParamValue::text(""),
        },
        "extra" => Msg::ExtraParamsEdited(rest.to_string()),
        "url" => Msg::UrlEdited(required(rest, "usage: url <url>")?.to_string()),
        "import" => Msg::ImportSubmitted(rest.to_string()),
        "reset" => Msg::ResetClicked,
        "simplify" => Msg::SimplifyClicked,
        "export" => Msg::ExportClicked,
        "copy" => Msg::CopyUrlClicked,
        "width" => {
            let columns = rest
                .parse::<usize>()
                .map_err(|_| format!("width expects a column count, got {rest:?}"))?;
            Msg::LineWidthChanged(columns)
        }
        "resize" => {
            let pixels = rest
                .parse::<f64>()
                .map_err(|_| format!("resize expects a pixel width, got {rest:?}"))?;
            Msg::LineWidthChanged(line_width_for(pixels))
        }
        "record" => match rest {
            "on" | "" => Msg::RecordToggled(true),
            "off" => Msg::RecordToggled(false),
            other => return Err(format!("record expects on or off, got {other:?}")),
        },
        "stop" => Msg::RecordToggled(false),
        "stream" => Msg::StreamFileRequested {
            path: required(rest, "usage: stream <file>")?.to_string(),
        },
        "upload" => Msg::UploadRequested {
            path: required(rest, "usage: upload <file>")?.to_string(),
        },
        "detect" => Msg::DetectAudioSettingsClicked,
        "clear" => Msg::ClearTranscriptClicked,
        other => return Err(format!("unknown command {other:?}, try help")),
    };
    Ok(Command::Dispatch(msg))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(usage.to_string())
    } else {
        Ok(rest)
    }
}

fn parse_value(values: &[&str]) -> ParamValue {
    match values {
        [] => ParamValue::text(""),
        ["true"] => ParamValue::Bool(true),
        ["false"] => ParamValue::Bool(false),
        [single] => match single.parse::<Number>() {
            Ok(number) => ParamValue::Number(number),
            Err(_) => ParamValue::text(*single),
        },
        many => ParamValue::list(many.iter().copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dispatched(line: &str) -> Msg {
        match parse_command(line) {
            Ok(Command::Dispatch(msg)) => msg,
            other => panic!("expected a message for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn set_infers_value_shape() {
        assert_eq!(
            dispatched("set punctuate true"),
            Msg::FieldEdited {
                name: "punctuate".to_string(),
                value: ParamValue::Bool(true),
            }
        );
        assert_eq!(
            dispatched("set sample_rate 16000"),
            Msg::FieldEdited {
                name: "sample_rate".to_string(),
                value: ParamValue::Number(Number::from(16000)),
            }
        );
        assert_eq!(
            dispatched("set redact pci ssn"),
            Msg::FieldEdited {
                name: "redact".to_string(),
                value: ParamValue::list(["pci", "ssn"]),
            }
        );
        assert_eq!(
            dispatched("set model nova-3"),
            Msg::FieldEdited {
                name: "model".to_string(),
                value: ParamValue::text("nova-3"),
            }
        );
    }

    #[test]
    fn url_and_import_keep_the_whole_argument() {
        assert_eq!(
            dispatched("url  http://api.deepgram.com/v1/listen?model=nova-3 "),
            Msg::UrlEdited("http://api.deepgram.com/v1/listen?model=nova-3".to_string())
        );
        assert_eq!(
            dispatched(r#"import {"model": "nova-2"}"#),
            Msg::ImportSubmitted(r#"{"model": "nova-2"}"#.to_string())
        );
    }

    #[test]
    fn session_commands() {
        assert_eq!(dispatched("record"), Msg::RecordToggled(true));
        assert_eq!(dispatched("record off"), Msg::RecordToggled(false));
        assert_eq!(dispatched("stop"), Msg::RecordToggled(false));
        assert_eq!(
            dispatched("stream /tmp/talk.wav"),
            Msg::StreamFileRequested {
                path: "/tmp/talk.wav".to_string()
            }
        );
        assert_eq!(dispatched("width 40"), Msg::LineWidthChanged(40));
    }

    #[test]
    fn local_commands_and_errors() {
        assert_eq!(parse_command(""), Ok(Command::Show));
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert!(parse_command("set").is_err());
        assert!(parse_command("width wide").is_err());
        assert!(parse_command("record maybe").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}
