use clap::{Parser, Subcommand};
use pharm_core::abbreviations::{expand_abbreviation, Frequency};
use pharm_core::picking::PickOutcome;
use pharm_core::receiving::ReceivingField;
use pharm_core::typing::{label_text, quantity_choices, LabelDraft, LabelOutcome};
use pharm_core::*;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pharmquest")]
#[command(about = "Community pharmacy practice game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play through a curriculum year (default)
    Play {
        /// Year to play (1-3); defaults to the configured year
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        year: Option<u8>,

        /// Auto-play the model answers (for testing)
        #[arg(long)]
        auto: bool,

        /// Print the final session snapshot as JSON instead of the narrative
        #[arg(long)]
        json: bool,
    },

    /// List the levels of each year
    Levels {
        /// Only this year
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        year: Option<u8>,
    },

    /// Show a medication's catalog record
    Med {
        /// Medication id, e.g. med-001
        id: String,
    },

    /// Validate the built-in catalog and content
    Check,
}

fn main() -> Result<()> {
    // Initialize logging
    pharm_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Play { year, auto, json }) => {
            cmd_play(year.unwrap_or(config.game.default_year), auto, json, &config)
        }
        Some(Commands::Levels { year }) => cmd_levels(year),
        Some(Commands::Med { id }) => cmd_med(&id),
        Some(Commands::Check) => cmd_check(),
        None => cmd_play(config.game.default_year, false, false, &config),
    }
}

fn cmd_levels(year: Option<u8>) -> Result<()> {
    let content = get_default_content();
    let years = match year {
        Some(y) => vec![YearLevel::try_from(y)?],
        None => vec![YearLevel::One, YearLevel::Two, YearLevel::Three],
    };

    for year in years {
        println!("{}", year);
        for level in content.levels_for_year(year) {
            println!(
                "  Ch {}  {:<28} {:?}  ({})",
                level.chapter, level.title, level.difficulty, level.prescription_id
            );
        }
        println!();
    }
    Ok(())
}

fn cmd_med(id: &str) -> Result<()> {
    let catalog = get_default_catalog();
    let med = catalog
        .lookup_medication(id)
        .ok_or_else(|| Error::UnknownMedication(id.to_string()))?;

    println!("\n  {}", med.display_name());
    println!("  Form: {}   Category: {:?}", med.dosage_form, med.category);
    println!("  Class: {}", med.drug_class);
    println!("  Action: {}", med.mechanism_of_action);
    print_list("Uses", &med.common_uses);
    print_list("Side effects", &med.side_effects);
    print_list("Counseling", &med.counseling_points);
    print_list("Warnings", &med.warnings);
    println!("  Storage: {}", med.storage);
    if let Some(unit) = &med.packing_unit {
        println!("  Packed as: {}", unit);
    }
    println!(
        "  Counseling questions: {}",
        catalog.questions_for_medication(&med.id).len()
    );
    println!();
    Ok(())
}

fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("  {}:", heading);
    for item in items {
        println!("    - {}", item);
    }
}

fn cmd_check() -> Result<()> {
    let catalog = get_default_catalog();
    let content = get_default_content();

    let mut errors = catalog.validate();
    errors.extend(content.validate(catalog));
    if !errors.is_empty() {
        eprintln!("Content validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::ContentValidation(format!(
            "{} problem(s) found",
            errors.len()
        )));
    }

    println!(
        "✓ Content OK: {} medications, {} questions, {} scenarios, {} prescriptions, {} levels",
        catalog.medications.len(),
        catalog.questions.len(),
        content.scenarios.len(),
        content.prescriptions.len(),
        content.levels.len()
    );
    Ok(())
}

fn cmd_play(year: u8, auto: bool, json: bool, config: &Config) -> Result<()> {
    let catalog = get_default_catalog();
    let content = get_default_content();
    let errors = content.validate(catalog);
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("{}", error);
        }
        return Err(Error::ContentValidation("Invalid content".into()));
    }

    let year = YearLevel::try_from(year)?;
    let screen = Screen { quiet: json };
    let mut game = Game::new(catalog, content, config)?;

    let mut player: Box<dyn Player> = if auto {
        Box::new(AutoPlayer)
    } else {
        Box::new(ConsolePlayer {
            input: io::stdin().lock(),
        })
    };

    run_year(&mut game, year, player.as_mut(), &screen)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&game.snapshot())?);
    }
    Ok(())
}

/// Narrative output, silenced in --json mode
struct Screen {
    quiet: bool,
}

impl Screen {
    fn line(&self, text: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", text.as_ref());
        }
    }
}

fn run_year(
    game: &mut Game,
    year: YearLevel,
    player: &mut dyn Player,
    screen: &Screen,
) -> Result<()> {
    // Generous upper bound on actions per year; hitting it means play is stuck
    const MAX_STEPS: usize = 1_000;

    let first = game.start_year(year)?;
    announce(game, &first, screen);

    for _ in 0..MAX_STEPS {
        if game.is_year_complete() {
            let s = game.session();
            screen.line(format!(
                "\n🎓 {} complete! Rx points: {} ({})",
                s.year(),
                s.rx_points(),
                s.rank()
            ));
            return Ok(());
        }

        let continuation = match game.session().stage() {
            Stage::Receiving => play_receiving(game, player, screen)?,
            Stage::Typing => play_typing(game, player, screen)?,
            Stage::Picking => play_picking(game, player, screen)?,
            Stage::Dispensing => play_dispensing(game, player, screen)?,
        };

        if let Some(continuation) = continuation {
            let transition = game.apply(continuation)?;
            announce(game, &transition, screen);
        }
    }

    Err(Error::ContentValidation(format!(
        "no way through {} after {} actions",
        year, MAX_STEPS
    )))
}

fn announce(game: &Game, transition: &Transition, screen: &Screen) {
    match transition {
        Transition::NextLevel { chapter, .. } => {
            if let Some(level) = game.current_level() {
                screen.line("\n╭─────────────────────────────────────────╮");
                screen.line(format!("│  {} · Chapter {}: {}", level.year, chapter, level.title));
                screen.line("╰─────────────────────────────────────────╯");
                screen.line(format!("  {}", level.description));
            }
        }
        Transition::NextStage { stage } => {
            screen.line(format!("\n── {} ──", stage.as_str().to_uppercase()));
        }
        Transition::Stayed { .. } => screen.line("  Try again."),
        Transition::YearComplete => {}
    }
}

fn active_prescription(game: &Game) -> Result<Prescription> {
    game.session()
        .prescription()
        .cloned()
        .ok_or(Error::NoActivePrescription)
}

fn play_receiving(
    game: &mut Game,
    player: &mut dyn Player,
    screen: &Screen,
) -> Result<Option<Continuation>> {
    let rx = active_prescription(game)?;

    if !game.receiving().is_investigating() {
        show_prescription(&rx, game.catalog(), screen);
        game.verify_identity()?;
        screen.line("  ✓ Patient identity verified");
        let conflicts = game.check_allergies()?;
        screen.line("  ✓ Allergies checked");
        for c in conflicts {
            screen.line(format!(
                "  ⚠ Patient is allergic to {} and {} is prescribed",
                c.allergy, c.generic_name
            ));
        }
        game.begin_investigation()?;
    }

    while let Some(field) = player.next_field(game.receiving().checked_fields())? {
        let finding = game.check_field(field)?;
        let verdict = if finding.has_issue { "⚠ issue" } else { "ok" };
        screen.line(format!("  [{}] {}", field, verdict));
    }

    let continuation = match &rx.scenario {
        Some(scenario) => {
            screen.line(format!("\n  {}", scenario.situation));
            screen.line(format!("  {}", scenario.question));
            let option_id = player.choose_option(scenario)?;
            let resolution = game.decide(&option_id)?;
            let c = &resolution.consequence;
            screen.line(format!("\n  {}", c.outcome));
            screen.line(format!("  Patient: {}", c.patient_reaction));
            screen.line(format!(
                "  {} ({:+} score, {:+} points) {}",
                if c.is_correct { "✓" } else { "✗" },
                c.score_impact,
                c.rx_points_impact,
                c.explanation
            ));
            resolution.continuation
        }
        None => {
            let (declared_valid, reason) = player.judge(&rx)?;
            let outcome = game.validate(declared_valid, reason)?;
            screen.line(format!(
                "  {} {}",
                if outcome.is_correct { "✓" } else { "✗" },
                outcome.feedback
            ));
            outcome.continuation
        }
    };
    Ok(Some(continuation))
}

fn show_prescription(rx: &Prescription, catalog: &Catalog, screen: &Screen) {
    screen.line(format!("\n  Patient: {} ({})", rx.patient_name, rx.patient_ic));
    if !rx.patient_allergies.is_empty() {
        screen.line(format!("  Allergies: {}", rx.patient_allergies.join(", ")));
    }
    screen.line(format!(
        "  Doctor: {}{}",
        rx.doctor_name,
        if rx.doctor_signature { " (signed)" } else { "" }
    ));
    match rx.date {
        Some(date) => screen.line(format!("  Date: {}", date)),
        None => screen.line("  Date: -"),
    }
    for item in &rx.medications {
        let name = catalog
            .lookup_medication(&item.medication_id)
            .map(|m| m.display_name())
            .unwrap_or_else(|| item.medication_id.clone());
        let freq = item
            .frequency
            .split(" or ")
            .map(|code| expand_abbreviation(code).unwrap_or(code))
            .collect::<Vec<_>>()
            .join(" or ");
        screen.line(format!(
            "  Rx: {}  {}  {}  {}",
            name,
            item.dosage_instruction,
            freq,
            item.duration.as_deref().unwrap_or("")
        ));
    }
}

fn play_typing(
    game: &mut Game,
    player: &mut dyn Player,
    screen: &Screen,
) -> Result<Option<Continuation>> {
    let Some(item) = game.current_item()?.cloned() else {
        return Ok(Some(Continuation::AdvanceStage));
    };
    let med = game
        .catalog()
        .lookup_medication(&item.medication_id)
        .ok_or_else(|| Error::UnknownMedication(item.medication_id.clone()))?;

    screen.line(format!(
        "\n  Label for {}: {} {}",
        med.display_name(),
        item.dosage_instruction,
        item.frequency
    ));
    let draft = player.draft_label(&item, med)?;

    match game.print_label(draft)? {
        LabelOutcome::Printed {
            reward,
            continuation,
        } => {
            screen.line(format!(
                "  ✓ Printed: \"{}\" (+{} score, +{} points)",
                label_text(&item, med),
                reward.score,
                reward.rx_points
            ));
            Ok(continuation)
        }
        LabelOutcome::Queried { patient_query, .. } => {
            screen.line(format!("  Patient: \"{}\"", patient_query));
            if player.respond_to_query(&patient_query)? {
                game.recheck_label()?;
                screen.line("  You take the label back to fix it.");
                Ok(None)
            } else {
                screen.line("  ✗ The patient follows the wrong label. Retype it.");
                Ok(game.insist_label())
            }
        }
    }
}

fn play_picking(
    game: &mut Game,
    player: &mut dyn Player,
    screen: &Screen,
) -> Result<Option<Continuation>> {
    let rx = active_prescription(game)?;
    let shelf = game.shelf()?;
    let basket = player.pick(&shelf, &rx)?;

    game.clear_selected_medications();
    for id in &basket {
        game.toggle_medication(id);
    }

    let outcome = game.submit_picking()?;
    match &outcome {
        PickOutcome::Blocked => {
            screen.line("  ⛔ Picking is blocked: resolve the allergy conflict at receiving first.");
            game.return_to_receiving();
            return Ok(None);
        }
        PickOutcome::Correct { reward } => screen.line(format!(
            "  ✓ Correct medications picked (+{} score, +{} points)",
            reward.score, reward.rx_points
        )),
        PickOutcome::Incorrect {
            missing,
            unexpected,
        } => screen.line(format!(
            "  ✗ Wrong basket. Missing {}, not prescribed {}",
            missing.len(),
            unexpected.len()
        )),
    }
    Ok(outcome.continuation())
}

fn play_dispensing(
    game: &mut Game,
    player: &mut dyn Player,
    screen: &Screen,
) -> Result<Option<Continuation>> {
    if !game.counter().counseling_complete() {
        screen.line("\n  Counsel the patient:");
        for question in game.counseling_questions()? {
            loop {
                let choice = player.answer(question)?;
                let Some(feedback) = game.answer_question(&question.id, choice) else {
                    break;
                };
                if feedback.is_correct {
                    screen.line(format!("  ✓ {}", feedback.explanation));
                    break;
                }
                screen.line(format!("  ✗ {}", feedback.explanation));
            }
        }
        if game.complete_counseling()? {
            let reward = game.rewards().counseling;
            screen.line(format!(
                "  ✓ Counseling complete (+{} score, +{} points)",
                reward.score, reward.rx_points
            ));
        }
    }

    let s = game.session();
    screen.line(format!(
        "  Level score: {}   Rx points: {} ({})",
        s.score(),
        s.rx_points(),
        s.rank()
    ));
    Ok(Some(game.finish_dispensing()?))
}

/// Source of the player's decisions
trait Player {
    /// Next field to inspect, `None` when ready to decide
    fn next_field(&mut self, checked: &BTreeSet<ReceivingField>) -> Result<Option<ReceivingField>>;
    fn choose_option(&mut self, scenario: &Scenario) -> Result<String>;
    fn judge(&mut self, rx: &Prescription) -> Result<(bool, Option<InvalidReason>)>;
    fn draft_label(&mut self, item: &PrescriptionItem, med: &Medication) -> Result<LabelDraft>;
    /// `true` to recheck the label, `false` to insist
    fn respond_to_query(&mut self, query: &str) -> Result<bool>;
    fn pick(
        &mut self,
        shelf: &[(MedicationCategory, Vec<&Medication>)],
        rx: &Prescription,
    ) -> Result<Vec<String>>;
    fn answer(&mut self, question: &CounselingQuestion) -> Result<usize>;
}

/// Plays the authored model answers
struct AutoPlayer;

impl Player for AutoPlayer {
    fn next_field(&mut self, checked: &BTreeSet<ReceivingField>) -> Result<Option<ReceivingField>> {
        Ok(ReceivingField::ALL
            .into_iter()
            .find(|f| !checked.contains(f)))
    }

    fn choose_option(&mut self, scenario: &Scenario) -> Result<String> {
        let model_is_correct = scenario
            .consequence(&scenario.correct_action)
            .is_some_and(|c| c.is_correct);
        if model_is_correct {
            return Ok(scenario.correct_action.clone());
        }
        scenario
            .options
            .iter()
            .find(|o| scenario.consequence(&o.id).is_some_and(|c| c.is_correct))
            .map(|o| o.id.clone())
            .ok_or_else(|| {
                Error::ContentValidation(format!(
                    "Scenario '{}' has no correct option",
                    scenario.id
                ))
            })
    }

    fn judge(&mut self, rx: &Prescription) -> Result<(bool, Option<InvalidReason>)> {
        Ok((rx.is_valid, rx.invalid_reason))
    }

    fn draft_label(&mut self, item: &PrescriptionItem, med: &Medication) -> Result<LabelDraft> {
        let frequency = Frequency::parse_alternatives(&item.frequency)
            .first()
            .copied()
            .ok_or_else(|| {
                Error::ContentValidation(format!(
                    "Frequency '{}' of '{}' cannot be typed",
                    item.frequency, item.medication_id
                ))
            })?;
        Ok(LabelDraft {
            quantity: item.quantity,
            dosage_form: med.dosage_form,
            frequency,
        })
    }

    fn respond_to_query(&mut self, _query: &str) -> Result<bool> {
        Ok(true)
    }

    fn pick(
        &mut self,
        _shelf: &[(MedicationCategory, Vec<&Medication>)],
        rx: &Prescription,
    ) -> Result<Vec<String>> {
        Ok(rx
            .required_medication_ids()
            .into_iter()
            .map(String::from)
            .collect())
    }

    fn answer(&mut self, question: &CounselingQuestion) -> Result<usize> {
        Ok(question.correct_answer)
    }
}

/// Reads decisions from the terminal
struct ConsolePlayer<R> {
    input: R,
}

impl<R: BufRead> ConsolePlayer<R> {
    fn prompt(&mut self, message: &str) -> Result<String> {
        print!("{} ", message);
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
        }
        Ok(line.trim().to_string())
    }

    /// Zero-based pick from a numbered list of `count` entries
    fn choose(&mut self, message: &str, count: usize) -> Result<usize> {
        loop {
            let reply = self.prompt(message)?;
            match reply.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
                _ => println!("  Enter a number from 1 to {}", count),
            }
        }
    }

    fn parse_until_ok<T: std::str::FromStr>(&mut self, message: &str) -> Result<T> {
        loop {
            let reply = self.prompt(message)?;
            match reply.parse() {
                Ok(value) => return Ok(value),
                Err(_) => println!("  Not understood: '{}'", reply),
            }
        }
    }
}

impl<R: BufRead> Player for ConsolePlayer<R> {
    fn next_field(&mut self, checked: &BTreeSet<ReceivingField>) -> Result<Option<ReceivingField>> {
        let done: Vec<_> = checked.iter().map(|f| f.as_str()).collect();
        if !done.is_empty() {
            println!("  Checked: {}", done.join(", "));
        }
        loop {
            let reply = self.prompt(
                "Inspect a field (signature/date/patient/dosage/allergies), or Enter to decide:",
            )?;
            if reply.is_empty() {
                return Ok(None);
            }
            match reply.parse() {
                Ok(field) => return Ok(Some(field)),
                Err(e) => println!("  {}", e),
            }
        }
    }

    fn choose_option(&mut self, scenario: &Scenario) -> Result<String> {
        for (i, option) in scenario.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option.text);
        }
        let index = self.choose(">", scenario.options.len())?;
        Ok(scenario.options[index].id.clone())
    }

    fn judge(&mut self, _rx: &Prescription) -> Result<(bool, Option<InvalidReason>)> {
        let reply = self.prompt("Is this prescription valid? [y/n]:")?;
        if reply.eq_ignore_ascii_case("y") {
            return Ok((true, None));
        }
        for (i, reason) in InvalidReason::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, reason);
        }
        let index = self.choose("Reason:", InvalidReason::ALL.len())?;
        Ok((false, Some(InvalidReason::ALL[index])))
    }

    fn draft_label(&mut self, _item: &PrescriptionItem, med: &Medication) -> Result<LabelDraft> {
        let choices = quantity_choices(med.dosage_form)
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("/");
        let quantity = self.parse_until_ok(&format!("Quantity ({}):", choices))?;
        let dosage_form = self.parse_until_ok("Dosage form (tablet/capsule/syrup/inhaler/...):")?;
        let codes = Frequency::ALL
            .iter()
            .map(Frequency::code)
            .collect::<Vec<_>>()
            .join("/");
        let frequency = self.parse_until_ok(&format!("Frequency ({}):", codes))?;
        Ok(LabelDraft {
            quantity,
            dosage_form,
            frequency,
        })
    }

    fn respond_to_query(&mut self, _query: &str) -> Result<bool> {
        let reply = self.prompt("[r]echeck the label or [i]nsist it is right?")?;
        Ok(!reply.eq_ignore_ascii_case("i"))
    }

    fn pick(
        &mut self,
        shelf: &[(MedicationCategory, Vec<&Medication>)],
        _rx: &Prescription,
    ) -> Result<Vec<String>> {
        let mut listed = Vec::new();
        for (category, meds) in shelf {
            println!("  {:?}", category);
            for med in meds {
                listed.push(med.id.clone());
                println!("    {}. {}", listed.len(), med.display_name());
            }
        }
        loop {
            let reply = self.prompt("Pick (numbers separated by spaces):")?;
            let picked: Option<Vec<String>> = reply
                .split_whitespace()
                .map(|n| {
                    n.parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| listed.get(i).cloned())
                })
                .collect();
            match picked {
                Some(ids) if !ids.is_empty() => return Ok(ids),
                _ => println!("  Enter shelf numbers from 1 to {}", listed.len()),
            }
        }
    }

    fn answer(&mut self, question: &CounselingQuestion) -> Result<usize> {
        println!("\n  {}", question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        self.choose(">", question.options.len())
    }
}
