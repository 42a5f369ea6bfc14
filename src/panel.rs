// SPDX-License-Identifier: GPL-3.0-only
//! Line-oriented control panel
//!
//! Runs on the main thread next to the HTTP API and drives the same
//! [`MonitorControl`]. Every command prints the resulting status message.

use std::io::{self, BufRead, Write};

use crate::control::{MonitorControl, Preset};
use crate::devices;

const HELP: &str = "\
Commands:
  brightness <0-100>          set brightness
  contrast <0-100>            set contrast
  input <n>                   switch input
  preset <bright|normal|dark> apply a preset
  display <index>             control another display
  displays                    list detected displays
  status                      show current state
  help                        show this help
  quit                        exit";

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    SetBrightness(f32),
    SetContrast(f32),
    SetInput(i64),
    ApplyPreset(Preset),
    SelectDisplay(usize),
    ListDisplays,
    Status,
    Help,
    Quit,
}

fn argument<'a>(arg: Option<&'a str>, usage: &str) -> Result<&'a str, String> {
    arg.ok_or_else(|| format!("usage: {usage}"))
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<PanelCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for '{name}'"));
    }

    let command = match name.to_ascii_lowercase().as_str() {
        "brightness" | "b" => {
            let value = argument(arg, "brightness <0-100>")?;
            PanelCommand::SetBrightness(
                value
                    .parse()
                    .map_err(|_| format!("'{value}' is not a number"))?,
            )
        }
        "contrast" | "c" => {
            let value = argument(arg, "contrast <0-100>")?;
            PanelCommand::SetContrast(
                value
                    .parse()
                    .map_err(|_| format!("'{value}' is not a number"))?,
            )
        }
        "input" | "i" => {
            let value = argument(arg, "input <n>")?;
            PanelCommand::SetInput(
                value
                    .parse()
                    .map_err(|_| format!("'{value}' is not an input number"))?,
            )
        }
        "preset" | "p" => {
            PanelCommand::ApplyPreset(argument(arg, "preset <bright|normal|dark>")?.parse()?)
        }
        "display" | "d" => {
            let value = argument(arg, "display <index>")?;
            PanelCommand::SelectDisplay(
                value
                    .parse()
                    .map_err(|_| format!("'{value}' is not a display index"))?,
            )
        }
        "displays" => PanelCommand::ListDisplays,
        "status" | "s" => PanelCommand::Status,
        "help" | "?" => PanelCommand::Help,
        "quit" | "exit" | "q" => PanelCommand::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };

    Ok(Some(command))
}

/// Execute a command; returns `false` when the panel should exit
pub fn handle<W: Write>(
    control: &MonitorControl,
    command: PanelCommand,
    output: &mut W,
) -> io::Result<bool> {
    debug!("{:?}", command);

    let result = match command {
        PanelCommand::SetBrightness(value) => control.set_brightness(value),
        PanelCommand::SetContrast(value) => control.set_contrast(value),
        PanelCommand::SetInput(selector) => control.set_input_source(selector).map(|_| ()),
        PanelCommand::ApplyPreset(preset) => control.apply_preset(preset),
        PanelCommand::SelectDisplay(index) => control.select_display(index),
        PanelCommand::ListDisplays => {
            let displays = control.displays();
            if displays.is_empty() {
                writeln!(output, "No displays detected")?;
            }
            let selected = control.selected_display();
            for (index, display) in displays.iter().enumerate() {
                let marker = if index == selected { '*' } else { ' ' };
                writeln!(output, "{marker} {index}: {display}")?;
            }
            return Ok(true);
        }
        PanelCommand::Status => {
            let snapshot = control.snapshot();
            writeln!(
                output,
                "brightness {}%, contrast {}%, display {} of {}, {}",
                snapshot.brightness as u8,
                snapshot.contrast as u8,
                snapshot.selected_display,
                snapshot.display_count,
                if snapshot.hardware_initialized {
                    "initialized"
                } else {
                    "not initialized"
                }
            )?;
            writeln!(output, "{}", snapshot.status_message)?;
            return Ok(true);
        }
        PanelCommand::Help => {
            writeln!(output, "{HELP}")?;
            writeln!(output, "Inputs: {}", devices::describe_input_sources())?;
            return Ok(true);
        }
        PanelCommand::Quit => return Ok(false),
    };

    match result {
        Ok(()) => writeln!(output, "{}", control.status_message())?,
        Err(e) if e.is_rejection() => writeln!(output, "Error: {e}")?,
        Err(e) => writeln!(output, "Error: {e}\n{}", control.status_message())?,
    }
    Ok(true)
}

/// Read commands until `quit` or end of input
pub fn run<R: BufRead, W: Write>(
    control: &MonitorControl,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    writeln!(output, "{}", control.status_message())?;
    if !control.is_initialized() {
        writeln!(output, "No display under control; display commands will fail.")?;
    }
    writeln!(output, "Type 'help' for commands.")?;

    let mut line = String::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(&line) {
            Ok(Some(command)) => {
                if !handle(control, command, &mut output)? {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => writeln!(output, "{message}")?,
        }
    }

    info!("Control panel closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::testing::{RecordingTransport, fake_displays};

    fn run_script(control: &MonitorControl, script: &str) -> String {
        let mut output = Vec::new();
        run(control, script.as_bytes(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn control() -> (MonitorControl, RecordingTransport) {
        let transport = RecordingTransport::new();
        let control = MonitorControl::new(Box::new(transport.clone()));
        control.initialize(|| Ok(fake_displays())).unwrap();
        (control, transport)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("brightness 42"),
            Ok(Some(PanelCommand::SetBrightness(42.0)))
        );
        assert_eq!(parse_command("  C 12.5 "), Ok(Some(PanelCommand::SetContrast(12.5))));
        assert_eq!(parse_command("input 3"), Ok(Some(PanelCommand::SetInput(3))));
        assert_eq!(
            parse_command("preset Dark"),
            Ok(Some(PanelCommand::ApplyPreset(Preset::Dark)))
        );
        assert_eq!(parse_command("display 1"), Ok(Some(PanelCommand::SelectDisplay(1))));
        assert_eq!(parse_command("quit"), Ok(Some(PanelCommand::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("brightness").is_err());
        assert!(parse_command("brightness high").is_err());
        assert!(parse_command("contrast 1 2").is_err());
        assert!(parse_command("preset dim").is_err());
        assert!(parse_command("display -1").is_err());
        assert!(parse_command("volume 3").is_err());
    }

    #[test]
    fn test_script_drives_control() {
        let (control, transport) = control();

        let output = run_script(&control, "brightness 30\ncontrast 60\ninput 2\nquit\nbrightness 99\n");

        assert!(output.contains("Brightness set to 30%"));
        assert!(output.contains("Contrast set to 60%"));
        assert!(output.contains("Input switched to HDMI 2"));
        // Nothing after quit runs
        assert_eq!(control.brightness(), 30.0);
        assert_eq!(transport.writes().len(), 3);
    }

    #[test]
    fn test_rejections_are_reported() {
        let (control, transport) = control();

        let output = run_script(&control, "brightness 150\ninput 9\nnonsense\n");

        assert!(output.contains("Brightness must be between 0 and 100"));
        assert!(output.contains("Unknown input source 9"));
        assert!(output.contains("unknown command 'nonsense'"));
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn test_failure_reports_status() {
        let (control, transport) = control();
        transport.set_failing(true);

        let output = run_script(&control, "contrast 10\n");

        assert!(output.contains("Failed to set contrast"));
        assert_eq!(control.contrast(), 50.0);
    }

    #[test]
    fn test_display_listing_and_selection() {
        let (control, transport) = control();

        let output = run_script(&control, "display 1\ndisplays\nbrightness 5\nstatus\n");

        assert!(output.contains("Selected display 1"));
        assert!(output.contains("* 1: DELL U2720Q (/dev/i2c-7)"));
        assert!(output.contains("  0: LG ULTRAGEAR (/dev/i2c-4)"));
        assert!(output.contains("brightness 5%, contrast 50%, display 1 of 2, initialized"));
        assert_eq!(transport.writes()[0].bus, 7);
    }

    #[test]
    fn test_preset_and_help() {
        let (control, _transport) = control();

        let output = run_script(&control, "help\npreset bright\n");

        assert!(output.contains("Inputs: 1=HDMI 1"));
        assert!(output.contains("Bright preset applied (brightness 80%, contrast 75%)"));
        assert_eq!(control.contrast(), 75.0);
    }

    #[test]
    fn test_fractional_level_reports_written_value() {
        let (control, transport) = control();

        let output = run_script(&control, "brightness 12.7
status
");

        assert!(output.contains("Brightness set to 12%"));
        assert!(output.contains("brightness 12%, contrast 50%"));
        assert_eq!(transport.writes()[0].value, 12);
    }

    #[test]
    fn test_uninitialized_panel() {
        let control = MonitorControl::new(Box::new(RecordingTransport::new()));

        let output = run_script(&control, "brightness 20\ndisplays\n");

        assert!(output.contains("No display under control"));
        assert!(output.contains("Error: Display control not initialized"));
        assert!(output.contains("No displays detected"));
    }
}
