//! Native functions installed into every interpreter's global scope.

use std::any::Any;
use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::interpreter::{Interpreter, RuntimeError};
use crate::runtime::{NativeFunction, NativeObject, Value};

/// Open file passed to scripts as an opaque handle. Closing empties it.
#[derive(Debug)]
pub struct FileHandle {
    file: RefCell<Option<File>>,
}

impl FileHandle {
    fn new(file: File) -> Self {
        Self {
            file: RefCell::new(Some(file)),
        }
    }

    fn with_file<T>(
        &self,
        function: &str,
        action: impl FnOnce(&mut File) -> std::io::Result<T>,
    ) -> Result<T, RuntimeError> {
        let mut slot = self.file.borrow_mut();
        let file = slot
            .as_mut()
            .ok_or_else(|| RuntimeError::native(function, "file stream is closed."))?;
        action(file).map_err(|error| RuntimeError::native(function, error.to_string()))
    }
}

impl NativeObject for FileHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        "file handle"
    }
}

pub fn install(interpreter: &mut Interpreter) {
    interpreter.define_native(NativeFunction::new("clock", 0, |_, _| {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default();
        Ok(Value::Number(seconds))
    }));

    interpreter.define_native(NativeFunction::new("input", 0, |interpreter, _| {
        let line = interpreter
            .read_line()
            .map_err(|error| RuntimeError::native("input", error.to_string()))?;
        Ok(match line {
            Some(line) => match line.trim().parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::string(line),
            },
            None => Value::Nil,
        })
    }));

    interpreter.define_native(NativeFunction::new("file_exists", 1, |_, arguments| {
        let path = string_arg("file_exists", "argument", &arguments[0])?;
        Ok(Value::Bool(Path::new(path).is_file()))
    }));

    interpreter.define_native(NativeFunction::new("file_readtext", 1, |_, arguments| {
        const NAME: &str = "file_readtext";
        let path = string_arg(NAME, "argument", &arguments[0])?;
        existing_file(NAME, path)?;
        fs::read_to_string(path)
            .map(Value::string)
            .map_err(|error| RuntimeError::native(NAME, error.to_string()))
    }));

    interpreter.define_native(NativeFunction::new("file_writetext", 2, |_, arguments| {
        const NAME: &str = "file_writetext";
        let path = string_arg(NAME, "first argument", &arguments[0])?;
        fs::write(path, arguments[1].to_string())
            .map_err(|error| RuntimeError::native(NAME, error.to_string()))?;
        Ok(Value::Nil)
    }));

    interpreter.define_native(NativeFunction::new("file_open", 2, |_, arguments| {
        const NAME: &str = "file_open";
        let path = string_arg(NAME, "first argument", &arguments[0])?;
        let mode = arguments[1]
            .as_number()
            .ok_or_else(|| RuntimeError::native(NAME, "second argument must be number."))?;
        let options = open_options(mode)
            .ok_or_else(|| RuntimeError::native(NAME, format!("unknown file mode {mode}.")))?;
        let file = options
            .open(path)
            .map_err(|error| RuntimeError::native(NAME, error.to_string()))?;
        Ok(Value::Handle(Rc::new(FileHandle::new(file))))
    }));

    interpreter.define_native(NativeFunction::new("file_close", 1, |_, arguments| {
        let handle = file_arg("file_close", &arguments[0])?;
        handle.file.borrow_mut().take();
        Ok(Value::Nil)
    }));

    interpreter.define_native(NativeFunction::new("file_write", 2, |_, arguments| {
        const NAME: &str = "file_write";
        let text = arguments[1].to_string();
        file_arg(NAME, &arguments[0])?.with_file(NAME, |file| file.write_all(text.as_bytes()))?;
        Ok(Value::Nil)
    }));

    interpreter.define_native(NativeFunction::new("file_writeline", 2, |_, arguments| {
        const NAME: &str = "file_writeline";
        let text = format!("{}\r\n", arguments[1]);
        file_arg(NAME, &arguments[0])?.with_file(NAME, |file| file.write_all(text.as_bytes()))?;
        Ok(Value::Nil)
    }));

    interpreter.define_native(NativeFunction::new("file_read", 1, |_, arguments| {
        const NAME: &str = "file_read";
        let character = file_arg(NAME, &arguments[0])?.with_file(NAME, read_char)?;
        Ok(character.map_or(Value::Nil, |character| Value::string(character.to_string())))
    }));

    interpreter.define_native(NativeFunction::new("file_readline", 1, |_, arguments| {
        const NAME: &str = "file_readline";
        let line = file_arg(NAME, &arguments[0])?.with_file(NAME, read_line)?;
        Ok(line.map_or(Value::Nil, Value::string))
    }));

    interpreter.define_native(NativeFunction::new("seek_bof", 1, |_, arguments| {
        const NAME: &str = "seek_bof";
        file_arg(NAME, &arguments[0])?.with_file(NAME, |file| file.seek(SeekFrom::Start(0)))?;
        Ok(Value::Nil)
    }));

    interpreter.define_native(NativeFunction::new("seek_eof", 1, |_, arguments| {
        const NAME: &str = "seek_eof";
        file_arg(NAME, &arguments[0])?.with_file(NAME, |file| file.seek(SeekFrom::End(0)))?;
        Ok(Value::Nil)
    }));
}

fn string_arg<'a>(function: &str, position: &str, value: &'a Value) -> Result<&'a str, RuntimeError> {
    value
        .as_str()
        .ok_or_else(|| RuntimeError::native(function, format!("{position} must be string.")))
}

fn file_arg<'a>(function: &str, value: &'a Value) -> Result<&'a FileHandle, RuntimeError> {
    let handle = match value {
        Value::Handle(handle) => handle.as_any().downcast_ref::<FileHandle>(),
        _ => None,
    };
    handle.ok_or_else(|| RuntimeError::native(function, "argument must be a valid file stream."))
}

fn existing_file(function: &str, path: &str) -> Result<(), RuntimeError> {
    if Path::new(path).is_file() {
        Ok(())
    } else {
        Err(RuntimeError::native(function, "file not found."))
    }
}

/// File modes: 1 create new, 2 create or truncate, 3 open, 4 open or create,
/// 5 truncate, 6 append.
fn open_options(mode: f64) -> Option<OpenOptions> {
    if mode.fract() != 0.0 {
        return None;
    }
    let mut options = OpenOptions::new();
    match mode as i64 {
        1 => options.read(true).write(true).create_new(true),
        2 => options.read(true).write(true).create(true).truncate(true),
        3 => options.read(true).write(true),
        4 => options.read(true).write(true).create(true),
        5 => options.read(true).write(true).truncate(true),
        6 => options.append(true).create(true),
        _ => return None,
    };
    Some(options)
}

/// Reads one UTF-8 encoded character, or `None` at end of file.
fn read_char(file: &mut File) -> std::io::Result<Option<char>> {
    let mut buffer = [0u8; 4];
    if file.read(&mut buffer[..1])? == 0 {
        return Ok(None);
    }
    let width = match buffer[0] {
        byte if byte < 0x80 => 1,
        byte if byte >> 5 == 0b110 => 2,
        byte if byte >> 4 == 0b1110 => 3,
        _ => 4,
    };
    file.read_exact(&mut buffer[1..width])?;
    let decoded = std::str::from_utf8(&buffer[..width])
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
    Ok(decoded.chars().next())
}

/// Reads up to the next `\n`, dropping any `\r`. `None` when already at end of file.
fn read_line(file: &mut File) -> std::io::Result<Option<String>> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    let mut read_any = false;
    while file.read(&mut byte)? == 1 {
        read_any = true;
        match byte[0] {
            b'\n' => break,
            b'\r' => {}
            other => bytes.push(other),
        }
    }
    if !read_any {
        return Ok(None);
    }
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::session::{CapturedOutput, Session, SessionOptions};

    fn session_with_input(input: &str) -> (Session, CapturedOutput) {
        let output = CapturedOutput::default();
        let interpreter = Interpreter::with_output(Box::new(output.clone()))
            .with_input(Box::new(Cursor::new(input.to_string())));
        (Session::with_interpreter(interpreter, SessionOptions::default()), output)
    }

    fn scratch_path(name: &str) -> String {
        let dir = std::env::temp_dir().join("loxwalk-builtins");
        fs::create_dir_all(&dir).expect("create scratch dir");
        let path = dir.join(format!("{}-{name}", std::process::id()));
        let _ = fs::remove_file(&path);
        path.to_string_lossy().replace('\\', "/")
    }

    #[test]
    fn input_returns_numbers_when_line_parses() {
        let (mut session, output) = session_with_input("41\nhello\n");
        session
            .run("var n = input(); var s = input(); print n + 1; print s; print input();")
            .expect("run failed");
        assert_eq!(output.contents(), "42\nhello\nnil\n");
    }

    #[test]
    fn writes_and_reads_whole_files() {
        let path = scratch_path("whole.txt");
        let (mut session, output) = session_with_input("");
        let source = format!(
            "print file_exists(\"{path}\");\
             file_writetext(\"{path}\", \"line \" + 1);\
             print file_exists(\"{path}\");\
             print file_readtext(\"{path}\");"
        );
        session.run(&source).expect("run failed");
        assert_eq!(output.contents(), "false\ntrue\nline 1\n");
    }

    #[test]
    fn streams_lines_and_characters() {
        let path = scratch_path("stream.txt");
        let (mut session, output) = session_with_input("");
        let source = format!(
            "var f = file_open(\"{path}\", 2);\
             file_writeline(f, \"first\");\
             file_write(f, \"é2\");\
             seek_bof(f);\
             print file_readline(f);\
             print file_read(f);\
             print file_read(f);\
             print file_read(f);\
             seek_eof(f);\
             print file_readline(f);\
             file_close(f);\
             print f;"
        );
        session.run(&source).expect("run failed");
        assert_eq!(output.contents(), "first\né\n2\nnil\nnil\n<file handle>\n");
    }

    #[test]
    fn rejects_bad_arguments_with_call_site_line() {
        let (mut session, _) = session_with_input("");
        let error = session
            .run("var x = 1;\nfile_close(x);")
            .expect_err("expected runtime error");
        assert_eq!(
            error.to_string(),
            "file_close: argument must be a valid file stream.\n[line 2]"
        );

        let error = session
            .run("file_readtext(\"/definitely/not/here.txt\");")
            .expect_err("expected runtime error");
        assert_eq!(error.to_string(), "file_readtext: file not found.\n[line 1]");

        let error = session
            .run("file_open(\"x\", \"2\");")
            .expect_err("expected runtime error");
        assert_eq!(
            error.to_string(),
            "file_open: second argument must be number.\n[line 1]"
        );
    }

    #[test]
    fn reports_use_after_close() {
        let path = scratch_path("closed.txt");
        let (mut session, _) = session_with_input("");
        let source = format!("var f = file_open(\"{path}\", 4); file_close(f); file_write(f, 1);");
        let error = session.run(&source).expect_err("expected runtime error");
        assert_eq!(error.to_string(), "file_write: file stream is closed.\n[line 1]");
    }

    #[test]
    fn natives_print_their_names() {
        let (mut session, output) = session_with_input("");
        session.run("print clock; print clock() > 0;").expect("run failed");
        assert_eq!(output.contents(), "<native fn 'clock'>\ntrue\n");
    }
}
