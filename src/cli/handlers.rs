use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc, Weekday};

use crate::cli::commands::{
    Cli, Commands, IdsAction, IdsArgs, ListArgs, PlanArgs, PropArgs, RecurArgs, RefileArgs,
    StateArgs, TagArgs, WaitArgs,
};
use crate::cli::output::{print_json, waiting_text, HeadingRow};
use crate::io::config_io::load_config;
use crate::io::doc_io::{corpus_files, read_lines, write_lines};
use crate::io::lock::CorpusLock;
use crate::io::registry::{ensure_unique, generate_id, CorpusIndex, IdLocation};
use crate::model::config::Config;
use crate::model::heading::Heading;
use crate::model::planning::{AnchorMode, PlanningDate};
use crate::model::recurring::RecurringRecord;
use crate::model::waiting::{Priority, WaitingRecord};
use crate::ops::mutate::{set_planning, set_state, set_tags, PlanningEdit};
use crate::ops::{recurring, refile, waiting};
use crate::parse::index::{find_by_id, index};
use crate::parse::planning::{parse_repeater, PlanningKind};
use crate::parse::properties::{self, ID_KEY};

/// Keyword applied when a waiting record is attached, if the configured
/// keyword set knows it.
const WAITING_STATE: &str = "WAITING";

/// Sentinel value that clears instead of sets.
const CLEAR: &str = "clear";

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let root = PathBuf::from(cli.corpus_dir.as_deref().unwrap_or("."));
    let config = load_config(&root)?;
    let json = cli.json;

    // Writers serialize on the corpus lock; read-only commands skip it
    let _lock = match &cli.command {
        Commands::List(_)
        | Commands::Ids(IdsArgs {
            action: IdsAction::Check,
        }) => None,
        _ => Some(CorpusLock::acquire(&root)?),
    };

    match &cli.command {
        Commands::List(args) => cmd_list(args, &config, json),
        Commands::State(args) => cmd_state(args, &config, json),
        Commands::Schedule(args) => cmd_plan(args, PlanningKind::Scheduled, &config, json),
        Commands::Deadline(args) => cmd_plan(args, PlanningKind::Deadline, &config, json),
        Commands::Tag(args) => cmd_tag(args, &config, json),
        Commands::Prop(args) => cmd_prop(args, &config, json),
        Commands::Wait(args) => cmd_wait(args, &config, json),
        Commands::Recur(args) => cmd_recur(args, &config, json),
        Commands::Refile(args) => cmd_refile(args, &config, json),
        Commands::Ids(args) => match args.action {
            IdsAction::Check => cmd_ids_check(&root, &config, json),
            IdsAction::Assign => cmd_ids_assign(&root, &config, json),
        },
    }
}

/// Resolve an identifier to its heading, or a user-facing error.
fn locate(lines: &[String], config: &Config, id: &str) -> Result<Heading, Box<dyn Error>> {
    Ok(find_by_id(lines, &config.keywords, id)?
        .ok_or_else(|| format!("no heading with id {}", id))?)
}

/// Re-index after an edit and print the heading's current row. Every edit
/// in this module leaves the heading line itself in place, so its position
/// is still valid here.
fn print_heading(
    lines: &[String],
    heading_line: usize,
    config: &Config,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let heading = index(lines, &config.keywords)?
        .into_iter()
        .find(|h| h.line == heading_line)
        .ok_or("heading vanished during edit")?;
    let id = properties::get(lines, heading_line, ID_KEY)?;
    let row = HeadingRow::new(&heading, id);
    if json {
        print_json(&row)?;
    } else {
        println!("{}", row.text());
    }
    Ok(())
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("bad date {:?}, expected YYYY-MM-DD", value).into())
}

fn cmd_list(args: &ListArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let lines = read_lines(Path::new(&args.file))?;
    let mut rows = Vec::new();
    for heading in index(&lines, &config.keywords)? {
        let id = properties::get(&lines, heading.line, ID_KEY)?;
        rows.push(HeadingRow::new(&heading, id));
    }
    if json {
        print_json(&rows)?;
    } else {
        for row in &rows {
            println!("{}", row.text());
        }
    }
    Ok(())
}

fn cmd_state(args: &StateArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let path = Path::new(&args.file);
    let mut lines = read_lines(path)?;
    let heading = locate(&lines, config, &args.id)?;

    let new_state = match args.state.as_str() {
        "none" => None,
        state => Some(state),
    };

    // Completing a recurring heading reschedules it instead of finishing it
    let mut rescheduled = false;
    if let Some(state) = new_state {
        if config.keywords.is_done(state) {
            let today = Local::now().date_naive();
            rescheduled = recurring::reschedule_done(&mut lines, heading.line, today, &config.keywords)?
                .is_some();
        }
    }
    if !rescheduled {
        set_state(&mut lines, heading.line, new_state, &config.keywords)?;
    }

    write_lines(path, &lines)?;
    print_heading(&lines, heading.line, config, json)
}

fn cmd_plan(
    args: &PlanArgs,
    kind: PlanningKind,
    config: &Config,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let path = Path::new(&args.file);
    let mut lines = read_lines(path)?;
    let heading = locate(&lines, config, &args.id)?;

    let edit = if args.date == CLEAR {
        if args.repeat.is_some() {
            return Err("--repeat cannot be combined with clear".into());
        }
        PlanningEdit::Clear
    } else {
        let date = parse_cli_date(&args.date)?;
        let repeater = match &args.repeat {
            None => None,
            Some(token) => Some(parse_repeater(token).ok_or_else(|| {
                format!("bad repeater {:?}, expected forms like +1w, .+3d, ++2m", token)
            })?),
        };
        PlanningEdit::Set(PlanningDate { date, repeater })
    };

    match kind {
        PlanningKind::Scheduled => {
            set_planning(&mut lines, heading.line, edit, PlanningEdit::Keep)?
        }
        PlanningKind::Deadline => {
            set_planning(&mut lines, heading.line, PlanningEdit::Keep, edit)?
        }
    };

    write_lines(path, &lines)?;
    print_heading(&lines, heading.line, config, json)
}

fn cmd_tag(args: &TagArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let path = Path::new(&args.file);
    let mut lines = read_lines(path)?;
    let heading = locate(&lines, config, &args.id)?;
    set_tags(&mut lines, heading.line, &args.tags, &config.keywords)?;
    write_lines(path, &lines)?;
    print_heading(&lines, heading.line, config, json)
}

fn cmd_prop(args: &PropArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let path = Path::new(&args.file);
    let mut lines = read_lines(path)?;
    let heading = locate(&lines, config, &args.id)?;

    if args.delete {
        properties::delete(&mut lines, heading.line, &args.key)?;
        write_lines(path, &lines)?;
        return Ok(());
    }
    if let Some(value) = &args.value {
        properties::set(&mut lines, heading.line, &args.key, value)?;
        write_lines(path, &lines)?;
        return Ok(());
    }

    let value = properties::get(&lines, heading.line, &args.key)?;
    if json {
        print_json(&serde_json::json!({ "key": args.key, "value": value }))?;
        Ok(())
    } else {
        match value {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(format!("no property {} on heading {}", args.key, args.id).into()),
        }
    }
}

fn cmd_wait(args: &WaitArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let path = Path::new(&args.file);
    let mut lines = read_lines(path)?;
    let heading = locate(&lines, config, &args.id)?;

    let has_edits = args.clear
        || args.who.is_some()
        || args.what.is_some()
        || args.requested.is_some()
        || args.follow_up.is_some()
        || args.channel.is_some()
        || args.priority.is_some()
        || args.notes.is_some();

    if !has_edits {
        let record = waiting::decode(&lines, heading.line)?;
        if json {
            print_json(&record)?;
        } else {
            println!("{}", waiting_text(&record));
        }
        return Ok(());
    }

    let mut record = if args.clear {
        WaitingRecord::default()
    } else {
        waiting::decode(&lines, heading.line)?
    };
    if !args.clear {
        if let Some(who) = &args.who {
            record.who = Some(who.clone());
        }
        if let Some(what) = &args.what {
            record.what = Some(what.clone());
        }
        if let Some(requested) = &args.requested {
            record.requested_on = Some(parse_cli_date(requested)?);
        }
        if let Some(follow_up) = &args.follow_up {
            record.follow_up_on = Some(parse_cli_date(follow_up)?);
        }
        if let Some(channel) = &args.channel {
            record.channel = Some(channel.clone());
        }
        if let Some(priority) = &args.priority {
            record.priority = Some(priority.parse::<Priority>()?);
        }
        if let Some(notes) = &args.notes {
            record.notes = Some(notes.clone());
        }
    }

    waiting::encode(&mut lines, heading.line, &record)?;
    if !args.clear && config.keywords.contains(WAITING_STATE) {
        set_state(&mut lines, heading.line, Some(WAITING_STATE), &config.keywords)?;
    }

    write_lines(path, &lines)?;
    print_heading(&lines, heading.line, config, json)
}

fn cmd_recur(args: &RecurArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let (interval, unit) = recurring::parse_every(&args.every)
        .ok_or_else(|| format!("bad interval {:?}, expected forms like 1w, 3d, 2m", args.every))?;
    let anchor = AnchorMode::parse_name(&args.anchor).ok_or_else(|| {
        format!(
            "bad anchor {:?}, expected scheduled, completion, or deadline",
            args.anchor
        )
    })?;
    let weekday = match &args.weekday {
        None => None,
        Some(value) => Some(
            value
                .parse::<Weekday>()
                .map_err(|_| format!("bad weekday {:?}", value))?,
        ),
    };

    let path = Path::new(&args.file);
    let mut lines = read_lines(path)?;
    let heading = locate(&lines, config, &args.id)?;

    let record = RecurringRecord {
        unit,
        interval,
        anchor,
        weekday,
    };
    let now = Local::now();
    recurring::schedule_first(
        &mut lines,
        heading.line,
        &record,
        now.date_naive(),
        now.naive_local(),
    )?;

    write_lines(path, &lines)?;
    print_heading(&lines, heading.line, config, json)
}

fn cmd_refile(args: &RefileArgs, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let source_path = Path::new(&args.source);
    let dest_path = Path::new(&args.dest);
    if same_file(source_path, dest_path) {
        // Refiling a subtree onto itself moves nothing
        if json {
            print_json(&serde_json::json!({
                "id": args.id,
                "moved_lines": 0,
                "from": args.source,
                "to": args.dest,
            }))?;
        } else {
            println!("moved 0 line(s) to {}", args.dest);
        }
        return Ok(());
    }

    let mut source = read_lines(source_path)?;
    let mut dest = if dest_path.exists() {
        read_lines(dest_path)?
    } else {
        Vec::new()
    };
    let moved = refile::refile(&mut source, &mut dest, &args.id, &config.keywords)?;

    // Destination lands first; a crash between the writes duplicates the
    // subtree rather than losing it
    write_lines(dest_path, &dest)?;
    write_lines(source_path, &source)?;

    if json {
        print_json(&serde_json::json!({
            "id": args.id,
            "moved_lines": moved,
            "from": args.source,
            "to": args.dest,
        }))?;
    } else {
        println!("moved {} line(s) to {}", moved, args.dest);
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        // One of them may not exist yet; fall back to literal comparison
        _ => a == b,
    }
}

fn cmd_ids_check(root: &Path, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let mut corpus = CorpusIndex::new(config.id_cache_ttl_secs);
    let duplicates = corpus.rebuild(root, &config.extension, &config.keywords, Utc::now())?;

    let mut missing = 0usize;
    for file in corpus_files(root, &config.extension) {
        let lines = read_lines(&file)?;
        for heading in index(&lines, &config.keywords)? {
            if properties::get(&lines, heading.line, ID_KEY)?.is_none() {
                missing += 1;
            }
        }
    }

    if json {
        let rows: Vec<_> = duplicates
            .iter()
            .map(|(id, loc)| {
                serde_json::json!({ "id": id, "file": loc.file, "line": loc.line + 1 })
            })
            .collect();
        print_json(&serde_json::json!({
            "ids": corpus.len(),
            "missing": missing,
            "duplicates": rows,
        }))?;
    } else {
        println!(
            "{} identifier(s), {} heading(s) without one",
            corpus.len(),
            missing
        );
        for (id, loc) in &duplicates {
            println!("duplicate {} at {}:{}", id, loc.file.display(), loc.line + 1);
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(format!("{} duplicate identifier(s)", duplicates.len()).into())
    }
}

fn cmd_ids_assign(root: &Path, config: &Config, json: bool) -> Result<(), Box<dyn Error>> {
    let mut corpus = CorpusIndex::new(config.id_cache_ttl_secs);
    corpus.rebuild(root, &config.extension, &config.keywords, Utc::now())?;

    let now = Local::now();
    let mut assigned = 0usize;
    let mut regenerated = 0usize;

    for file in corpus_files(root, &config.extension) {
        let mut lines = read_lines(&file)?;
        // Insertions shift later headings; the index recorded positions at
        // scan time, so map current positions back through the running delta
        let mut file_delta = 0isize;
        let mut changed = false;
        let mut cursor = 0usize;
        loop {
            let heading = match index(&lines, &config.keywords)?
                .into_iter()
                .find(|h| h.line >= cursor)
            {
                Some(heading) => heading,
                None => break,
            };
            cursor = heading.line + 1;

            let scan_line = (heading.line as isize - file_delta) as usize;
            let owner = IdLocation {
                file: file.clone(),
                line: scan_line,
            };
            match properties::get(&lines, heading.line, ID_KEY)? {
                None => {
                    let (fresh, _) = ensure_unique(&generate_id(now), &owner, &corpus, now)?;
                    file_delta += properties::set(&mut lines, heading.line, ID_KEY, &fresh)?;
                    corpus.insert(fresh, owner);
                    assigned += 1;
                    changed = true;
                }
                Some(id) => {
                    let (unique, replaced) = ensure_unique(&id, &owner, &corpus, now)?;
                    if replaced {
                        file_delta += properties::set(&mut lines, heading.line, ID_KEY, &unique)?;
                        corpus.insert(unique, owner);
                        regenerated += 1;
                        changed = true;
                    }
                }
            }
        }
        if changed {
            write_lines(&file, &lines)?;
        }
    }

    if json {
        print_json(&serde_json::json!({
            "assigned": assigned,
            "regenerated": regenerated,
        }))?;
    } else {
        println!(
            "assigned {} identifier(s), regenerated {} duplicate(s)",
            assigned, regenerated
        );
    }
    Ok(())
}
