use crossterm::event::{ Event, KeyCode, KeyEventKind, KeyModifiers };
use crossterm::{ execute, style::{ Color, SetForegroundColor, ResetColor } };
use cool_rust_input::{ CoolInput, CustomInput, set_terminal_line, KeyPressResult };
use std::io::stdout;
use std::path::{ Path, PathBuf };
use tracing::{ debug, error, warn };

use crate::api::FileApi;
use crate::error::Result;
use crate::navigator::{ Navigator, Opened };
use crate::paths;

struct EditFileInput {
    file_name: String,
    should_save_file: bool,
    should_continue: bool,
}
impl CustomInput for EditFileInput {
    fn get_offset(&mut self, _terminal_size: (u16, u16), _current_text: String) -> (u16, u16) {
        (0, 3)
    }
    fn get_size(&mut self, terminal_size: (u16, u16), _current_text: String) -> (u16, u16) {
        (terminal_size.0, terminal_size.1.saturating_sub(3))
    }
    fn before_draw_text(&mut self, _terminal_size: (u16, u16), _current_text: String) {
        let _ = execute!(stdout(), ResetColor);
    }
    fn after_draw_text(&mut self, _terminal_size: (u16, u16), _current_text: String) {
        let _ = execute!(stdout(), SetForegroundColor(Color::Blue));
        let header = format!("[{}]", self.file_name);
        let _ = set_terminal_line(&header, 0, 0, true);
        let _ = set_terminal_line(
            "ctrl+s to save | ctrl+q to exit | ctrl+x to save and exit",
            0,
            1,
            true
        );
    }
    fn handle_key_press(&mut self, key: &Event, _current_text: String) -> KeyPressResult {
        if let Event::Key(key_event) = key {
            if let KeyCode::Char(c) = key_event.code {
                if key_event.modifiers.contains(KeyModifiers::CONTROL) {
                    match c {
                        'x' => {
                            self.should_save_file = true;
                            return KeyPressResult::Stop;
                        }
                        'q' => {
                            self.should_save_file = false;
                            return KeyPressResult::Stop;
                        }
                        's' => {
                            self.should_save_file = true;
                            self.should_continue = true;
                            return KeyPressResult::Stop;
                        }
                        _ => {}
                    }
                }
            }
        }
        KeyPressResult::Continue
    }
}

struct ConfirmInput {
    question: String,
    accepted: bool,
}
impl CustomInput for ConfirmInput {
    fn get_offset(&mut self, _terminal_size: (u16, u16), _current_text: String) -> (u16, u16) {
        (0, 1)
    }
    fn get_size(&mut self, terminal_size: (u16, u16), _current_text: String) -> (u16, u16) {
        (terminal_size.0, 1)
    }
    fn before_draw_text(&mut self, _terminal_size: (u16, u16), _current_text: String) {
        let _ = execute!(stdout(), ResetColor);
    }
    fn after_draw_text(&mut self, _terminal_size: (u16, u16), _current_text: String) {
        let _ = execute!(stdout(), SetForegroundColor(Color::Red));
        let _ = set_terminal_line(&self.question, 0, 0, true);
    }
    fn handle_key_press(&mut self, key: &Event, _current_text: String) -> KeyPressResult {
        if let Event::Key(key_event) = key {
            if key_event.kind != KeyEventKind::Press {
                return KeyPressResult::Continue;
            }
            match key_event.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.accepted = true;
                    return KeyPressResult::Stop;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Enter => {
                    self.accepted = false;
                    return KeyPressResult::Stop;
                }
                _ => {}
            }
        }
        KeyPressResult::Continue
    }
}

fn confirm(question: String) -> bool {
    let mut input = CoolInput::new(ConfirmInput { question, accepted: false }, 4);
    if input.pre_listen().is_err() {
        return false;
    }
    let _ = input.render();
    let _ = input.listen_quiet();
    let _ = input.post_listen();
    input.custom_input.accepted
}

struct TerminalInput {
    error_message: String,
    status: String,
    cwd: String,
    dirs: String,
    files: String,
    items: Vec<String>,
    current_autocomplete: Option<String>,
    should_quit: bool,
    should_back: bool,
}
impl TerminalInput {
    fn autocomplete_input(&mut self, current_input: String) -> Option<String> {
        if current_input.is_empty() {
            return None;
        }
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.len());
        for item in &items {
            if item == &current_input {
                return None;
            }
            if let Some(rest) = item.strip_prefix(&current_input) {
                return Some(rest.to_string());
            }
        }
        None
    }
}
impl CustomInput for TerminalInput {
    fn get_offset(&mut self, _terminal_size: (u16, u16), _current_text: String) -> (u16, u16) {
        (0, 3)
    }
    fn get_size(&mut self, terminal_size: (u16, u16), _current_text: String) -> (u16, u16) {
        (terminal_size.0, terminal_size.1.saturating_sub(3))
    }
    fn before_draw_text(&mut self, _terminal_size: (u16, u16), _current_text: String) {
        let _ = execute!(stdout(), ResetColor);
    }
    fn after_draw_text(&mut self, _terminal_size: (u16, u16), current_text: String) {
        let _ = execute!(stdout(), SetForegroundColor(Color::Grey));
        let _ = set_terminal_line(&self.cwd, 0, 0, true);
        let _ = execute!(stdout(), SetForegroundColor(Color::Green));
        let _ = set_terminal_line(&self.dirs, 0, 1, true);
        let _ = execute!(stdout(), SetForegroundColor(Color::Blue));
        let _ = set_terminal_line(&self.files, self.dirs.chars().count() + 1, 1, false);
        if self.error_message.is_empty() {
            let _ = execute!(stdout(), SetForegroundColor(Color::Yellow));
            let _ = set_terminal_line(&self.status, 0, 2, true);
        } else {
            let _ = execute!(stdout(), SetForegroundColor(Color::Red));
            let _ = set_terminal_line(&self.error_message, 0, 2, true);
        }

        let _ = execute!(stdout(), SetForegroundColor(Color::DarkGrey));
        let input_length = current_text.chars().count();
        let autocomplete = self.autocomplete_input(current_text);
        if let Some(autocomplete) = autocomplete {
            let _ = set_terminal_line(&autocomplete, input_length, 3, false);
            self.current_autocomplete = Some(autocomplete);
        } else {
            self.current_autocomplete = None;
        }
    }
    fn handle_key_press(&mut self, key: &Event, _current_text: String) -> KeyPressResult {
        if let Event::Key(key_event) = key {
            if key_event.kind == KeyEventKind::Press {
                if let KeyCode::Enter = key_event.code {
                    return KeyPressResult::Stop;
                }
                if let KeyCode::Esc = key_event.code {
                    self.should_back = true;
                    return KeyPressResult::Stop;
                }
                if let KeyCode::Char(c) = key_event.code {
                    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
                        if c == 'x' {
                            self.should_back = true;
                            return KeyPressResult::Stop;
                        }
                        if c == 'c' {
                            self.should_quit = true;
                            return KeyPressResult::Stop;
                        }
                    }
                }
            }
        }
        KeyPressResult::Continue
    }
}

#[derive(Debug, PartialEq)]
enum CommandResult {
    Ok,
    NotFound,
    BadArgs,
    Exit,
}

pub struct Shell<A> {
    nav: Navigator<A>,
    download_dir: PathBuf,
    error_message: String,
    confirm: fn(String) -> bool,
}

impl<A: FileApi> Shell<A> {
    pub fn new(nav: Navigator<A>, download_dir: PathBuf) -> Self {
        Shell { nav, download_dir, error_message: String::new(), confirm }
    }

    /// Browses `start`, or the first drive the server reports. Without any
    /// drives the root is used.
    pub async fn start(&mut self, start: Option<String>) -> Result<()> {
        let start = match start {
            Some(start) => start,
            None =>
                match self.nav.list_drives().await {
                    Ok(drives) => drives.first().cloned().unwrap_or_else(|| "/".to_string()),
                    Err(e) => {
                        warn!(error = %e, "couldn't list drives, starting at /");
                        "/".to_string()
                    }
                }
        };
        self.nav.browse(&start).await
    }

    fn resolve(&self, name: &str) -> String {
        paths::resolve(&self.nav.session().listing_path, name)
    }

    fn list_dir(&self) -> (Vec<String>, String, String) {
        let mut dirs = String::new();
        let mut files = String::new();
        let mut items: Vec<String> = Vec::new();

        for entry in &self.nav.session().entries {
            if entry.is_dir {
                dirs += &format!("{} ", entry.name);
            } else {
                files += &format!("{} ", entry.name);
            }
            items.push(entry.name.to_string());
        }
        (items, dirs, files)
    }

    async fn open_path(&mut self, path: &str) -> Result<CommandResult> {
        if self.nav.open(path).await? == Opened::File {
            self.edit_file(path).await?;
        }
        Ok(CommandResult::Ok)
    }

    async fn handle_path(&mut self, name: &str) -> Result<CommandResult> {
        let known = self.nav
            .session()
            .entries.iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.path.to_string());
        match known {
            Some(path) => self.open_path(&path).await,
            None => Ok(CommandResult::NotFound),
        }
    }

    async fn edit_file(&mut self, path: &str) -> Result<()> {
        let mut input = CoolInput::new(EditFileInput {
            file_name: path.to_string(),
            should_save_file: false,
            should_continue: false,
        }, 4);
        input.text = self.nav.session().editor.to_string();
        let mut should_continue = true;
        input.pre_listen()?;
        let _ = input.render();
        while should_continue {
            input.custom_input.should_save_file = false;
            input.custom_input.should_continue = false;
            input.listen_quiet()?;
            should_continue = input.custom_input.should_continue;
            if input.custom_input.should_save_file {
                self.nav.select(path);
                if let Err(e) = self.nav.save(input.text.to_string()).await {
                    error!(path, error = %e, "save failed");
                    self.error_message = e.to_string();
                    break;
                }
            }
        }
        input.post_listen()?;
        Ok(())
    }

    async fn handle_command(&mut self, command: String) -> Result<CommandResult> {
        let mut args = command.split(' ').filter(|s| !s.is_empty());
        let keyword = args.next().unwrap_or("");
        let args: Vec<&str> = args.collect();
        debug!(keyword, ?args, "command");
        match keyword {
            "" => Ok(CommandResult::Ok),
            "drives" => {
                let drives = self.nav.list_drives().await?.join("  ");
                self.nav.set_status(format!("drives: {}", drives));
                Ok(CommandResult::Ok)
            }
            "drive" => {
                let [choice] = args[..] else {
                    return Ok(CommandResult::BadArgs);
                };
                let drives = self.nav.list_drives().await?.to_vec();
                let picked = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| drives.get(i).cloned())
                    .or_else(|| drives.iter().find(|d| d.as_str() == choice).cloned());
                match picked {
                    Some(drive) => {
                        self.nav.browse(&drive).await?;
                        Ok(CommandResult::Ok)
                    }
                    None => Ok(CommandResult::BadArgs),
                }
            }
            "ls" => {
                let path = match args[..] {
                    [] => self.nav.session().listing_path.to_string(),
                    [name] => self.resolve(name),
                    _ => {
                        return Ok(CommandResult::BadArgs);
                    }
                };
                self.nav.browse(&path).await?;
                Ok(CommandResult::Ok)
            }
            "cd" | "open" | "edit" => {
                let [name] = args[..] else {
                    return Ok(CommandResult::BadArgs);
                };
                let path = self.resolve(name);
                self.open_path(&path).await
            }
            ".." => {
                self.go_up().await?;
                Ok(CommandResult::Ok)
            }
            "n" | "new" => {
                let [name] = args[..] else {
                    return Ok(CommandResult::BadArgs);
                };
                let listing = self.nav.session().listing_path.to_string();
                self.nav.select(&listing);
                let path = self.nav.create(name).await?;
                self.nav.set_status(format!("created {}", path));
                Ok(CommandResult::Ok)
            }
            "d" | "mkdir" => {
                let [name] = args[..] else {
                    return Ok(CommandResult::BadArgs);
                };
                let listing = self.nav.session().listing_path.to_string();
                self.nav.select(&listing);
                let path = self.nav.mkdir(name).await?;
                self.nav.set_status(format!("created folder {}", path));
                Ok(CommandResult::Ok)
            }
            "rm" => {
                match args[..] {
                    [] => {}
                    [name] => {
                        let path = self.resolve(name);
                        self.nav.select(&path);
                    }
                    _ => {
                        return Ok(CommandResult::BadArgs);
                    }
                }
                let confirm = self.confirm;
                let deleted = self.nav.delete(|path| confirm(format!("Delete {} ? [y/n]", path))).await?;
                if deleted {
                    self.nav.set_status("deleted".to_string());
                }
                Ok(CommandResult::Ok)
            }
            "mv" => {
                let [from, to] = args[..] else {
                    return Ok(CommandResult::BadArgs);
                };
                let (from, to) = (self.resolve(from), self.resolve(to));
                self.nav.rename(&from, &to).await?;
                self.nav.set_status(format!("renamed {} -> {}", from, to));
                Ok(CommandResult::Ok)
            }
            "up" | "upload" => {
                let (local, name) = match args[..] {
                    [local] => (Path::new(local), paths::file_name(local)),
                    [local, name] => (Path::new(local), name),
                    _ => {
                        return Ok(CommandResult::BadArgs);
                    }
                };
                let listing = self.nav.session().listing_path.to_string();
                self.nav.select(&listing);
                let path = self.nav.upload(local, name).await?;
                self.nav.set_status(format!("uploaded {}", path));
                Ok(CommandResult::Ok)
            }
            "get" | "download" => {
                if let [name] = args[..] {
                    let path = self.resolve(name);
                    self.nav.select(&path);
                } else if !args.is_empty() {
                    return Ok(CommandResult::BadArgs);
                }
                let target = self.nav.download(&self.download_dir).await?;
                self.nav.set_status(format!("saved to {}", target.display()));
                Ok(CommandResult::Ok)
            }
            "url" => {
                let path = match args[..] {
                    [] => self.nav.session().current_path.to_string(),
                    [name] => self.resolve(name),
                    _ => {
                        return Ok(CommandResult::BadArgs);
                    }
                };
                let url = self.nav.api().download_url(&path)?;
                self.nav.set_status(url.to_string());
                Ok(CommandResult::Ok)
            }
            "p" | "prompt" => {
                if args.is_empty() {
                    return Ok(CommandResult::BadArgs);
                }
                self.nav.set_status("Processing...".to_string());
                self.nav.run_prompt(&args.join(" ")).await?;
                Ok(CommandResult::Ok)
            }
            "q" | "exit" => Ok(CommandResult::Exit),
            _ => self.handle_path(keyword).await,
        }
    }

    /// Returns false when already at a root.
    async fn go_up(&mut self) -> Result<bool> {
        match paths::up(&self.nav.session().listing_path) {
            Some(parent) => {
                self.nav.browse(&parent).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn listen_terminal(&mut self) -> Result<()> {
        let mut input = CoolInput::new(TerminalInput {
            error_message: String::new(),
            status: String::new(),
            cwd: String::new(),
            dirs: String::new(),
            files: String::new(),
            items: Vec::new(),
            current_autocomplete: None,
            should_quit: false,
            should_back: false,
        }, 4);

        input.pre_listen()?;
        loop {
            input.custom_input.error_message = self.error_message.to_string();
            input.custom_input.status = self.nav.session().status.to_string();
            input.custom_input.cwd = self.nav.session().listing_path.to_string();
            (input.custom_input.items, input.custom_input.dirs, input.custom_input.files) =
                self.list_dir();

            input.text = String::new();
            input.cursor_x = 0;
            input.cursor_y = 0;
            input.custom_input.should_back = false;
            let _ = input.render();
            input.listen_quiet()?;
            if input.custom_input.should_quit {
                break;
            }
            if input.custom_input.should_back {
                match self.go_up().await {
                    Ok(true) => {
                        self.error_message = String::new();
                    }
                    Ok(false) => {
                        break;
                    }
                    Err(e) => {
                        self.error_message = e.to_string();
                    }
                }
                continue;
            }
            let result = self.handle_command(input.text.to_string()).await;
            // nested inputs leave the terminal in their own mode
            input.pre_listen()?;
            match result {
                Ok(CommandResult::Ok) => {
                    self.error_message = String::new();
                }
                Ok(CommandResult::BadArgs) => {
                    self.error_message = "bad args".to_string();
                }
                Ok(CommandResult::NotFound) => {
                    let completed = input.custom_input.current_autocomplete
                        .as_ref()
                        .map(|autocomplete| format!("{}{}", input.text, autocomplete));
                    if let Some(full) = completed {
                        if let Err(e) = self.handle_path(&full).await {
                            self.error_message = e.to_string();
                        }
                        input.pre_listen()?;
                    } else {
                        self.error_message =
                            "unknown command or nonexisting file/directory".to_string();
                    }
                }
                Ok(CommandResult::Exit) => {
                    break;
                }
                Err(e) => {
                    error!(error = %e, "command failed");
                    self.error_message = e.to_string();
                }
            }
        }
        input.post_listen()?;
        Ok(())
    }
}
