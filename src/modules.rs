//! Read-only registries of the builtin modules and global functions.
//!
//! All tables are `static` and never mutated, so they can be shared freely
//! between concurrent analyses.

use std::path::{Path, PathBuf};

/// The types builtin signatures are described with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigType {
    Any,
    Integer,
    Double,
    /// `integer` or `double`.
    Number,
    String,
    Boolean,
    Null,
    Regexp,
    Array,
    Object,
    Function,
    /// A value with methods, by type tag.
    Resource(&'static str),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    /// Parameter names, with a `...` prefix for variadic ones.
    pub params: &'static [&'static str],
    /// How many leading parameters must be provided.
    pub required: usize,
    /// Alternatives of the return type.
    pub returns: &'static [SigType],
}

#[derive(Debug, PartialEq, Eq)]
pub struct Constant {
    pub name: &'static str,
    pub ty: SigType,
}

/// The methods available on values with a given type tag.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectType {
    pub tag: &'static str,
    pub methods: &'static [FunctionSignature],
}

#[derive(Debug, PartialEq, Eq)]
pub struct BuiltinModule {
    pub name: &'static str,
    functions: &'static [FunctionSignature],
    constants: &'static [Constant],
    object_types: &'static [ObjectType],
}

impl BuiltinModule {
    pub fn function_names(&self) -> impl Iterator<Item = &'static str> {
        self.functions.iter().map(|f| f.name)
    }

    pub fn functions(&self) -> &'static [FunctionSignature] {
        self.functions
    }

    pub fn function(&self, name: &str) -> Option<&'static FunctionSignature> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn constant(&self, name: &str) -> Option<&'static Constant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn constants(&self) -> &'static [Constant] {
        self.constants
    }

    /// Whether `name` may be imported from this module.
    pub fn is_valid_import(&self, name: &str) -> bool {
        self.function(name).is_some() || self.constant(name).is_some()
    }

    /// The methods of values tagged `tag`, if this module produces them.
    pub fn methods(&self, tag: &str) -> Option<&'static [FunctionSignature]> {
        self.object_types
            .iter()
            .find(|o| o.tag == tag)
            .map(|o| o.methods)
    }

    pub fn object_types(&self) -> &'static [ObjectType] {
        self.object_types
    }

    /// The first object type of this module that has a method `name`.
    pub fn object_type_with_method(&self, name: &str) -> Option<&'static ObjectType> {
        self.object_types
            .iter()
            .find(|o| o.methods.iter().any(|m| m.name == name))
    }
}

/// Looks up a builtin module by its import name.
pub fn lookup(name: &str) -> Option<&'static BuiltinModule> {
    MODULES.get(name).copied()
}

/// Looks up a method of values tagged `tag` (e.g. `read` of `fs.file`).
pub fn method(tag: &str, name: &str) -> Option<&'static FunctionSignature> {
    let (module, _) = tag.split_once('.')?;
    lookup(module)?
        .methods(tag)?
        .iter()
        .find(|m| m.name == name)
}

/// Looks up a global builtin function, such as `length` or `sprintf`.
pub fn global(name: &str) -> Option<&'static FunctionSignature> {
    GLOBALS.get(name)
}

/// Looks up a predefined global value, such as `ARGV`.
pub fn global_constant(name: &str) -> Option<&'static Constant> {
    GLOBAL_CONSTANTS.get(name)
}

pub fn global_names() -> impl Iterator<Item = &'static str> {
    GLOBALS.keys().chain(GLOBAL_CONSTANTS.keys()).copied()
}

/// Whether an import source refers to a script file rather than a module
/// name: it starts with `./`, `../` or `/`.
pub fn is_path(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../") || source.starts_with('/')
}

/// The file an import source refers to, with `.uc` appended when missing.
/// `None` for module names.
pub fn module_path(source: &str) -> Option<PathBuf> {
    if !is_path(source) {
        return None;
    }
    let path = if Path::new(source).extension().is_some_and(|ext| ext == "uc") {
        PathBuf::from(source)
    } else {
        PathBuf::from(format!("{source}.uc"))
    };
    Some(path)
}

/// Answers whether imported script files exist.
pub trait SourceLoader {
    fn exists(&self, path: &Path) -> bool;
}

impl<F> SourceLoader for F
where
    F: Fn(&Path) -> bool,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Resolves relative imports against the importing script's directory.
#[derive(Clone, Debug)]
pub struct DiskLoader {
    base: PathBuf,
}

impl DiskLoader {
    pub fn new(base: impl Into<PathBuf>) -> DiskLoader {
        DiskLoader { base: base.into() }
    }

    /// A loader for imports of the script at `script`.
    pub fn for_script(script: &Path) -> DiskLoader {
        let base = script.parent().unwrap_or(Path::new("."));
        DiskLoader::new(base)
    }
}

impl SourceLoader for DiskLoader {
    fn exists(&self, path: &Path) -> bool {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };
        tracing::trace!(path = %path.display(), "checking import");
        path.is_file()
    }
}

const fn f(
    name: &'static str,
    params: &'static [&'static str],
    required: usize,
    returns: &'static [SigType],
) -> FunctionSignature {
    FunctionSignature {
        name,
        params,
        required,
        returns,
    }
}

const fn c(name: &'static str, ty: SigType) -> Constant {
    Constant { name, ty }
}

use SigType::{
    Any, Array as Arr, Boolean as Bool, Double as Dbl, Function as Func, Integer as Int, Null,
    Number as Num, Object as Obj, Regexp as Re, String as Str,
};

const ANY: &[SigType] = &[Any];
const BOOL: &[SigType] = &[Bool];
const BOOL_OR_NULL: &[SigType] = &[Bool, Null];
const INT: &[SigType] = &[Int];
const INT_OR_NULL: &[SigType] = &[Int, Null];
const DBL: &[SigType] = &[Dbl];
const NUM: &[SigType] = &[Num];
const STR: &[SigType] = &[Str];
const STR_OR_NULL: &[SigType] = &[Str, Null];
const ARR_OR_NULL: &[SigType] = &[Arr, Null];
const OBJ_OR_NULL: &[SigType] = &[Obj, Null];
const NULL: &[SigType] = &[Null];

static MODULES: phf::Map<&'static str, &'static BuiltinModule> = phf::phf_map! {
    "math" => &MATH,
    "fs" => &FS,
    "digest" => &DIGEST,
    "log" => &LOG,
    "socket" => &SOCKET,
    "struct" => &STRUCT,
    "ubus" => &UBUS,
    "uci" => &UCI,
    "uloop" => &ULOOP,
    "zlib" => &ZLIB,
    "nl80211" => &NL80211,
    "rtnl" => &RTNL,
    "resolv" => &RESOLV,
};

static MATH: BuiltinModule = BuiltinModule {
    name: "math",
    functions: &[
        f("abs", &["number"], 1, NUM),
        f("atan2", &["y", "x"], 2, DBL),
        f("cos", &["x"], 1, DBL),
        f("exp", &["x"], 1, DBL),
        f("log", &["x"], 1, DBL),
        f("sin", &["x"], 1, DBL),
        f("sqrt", &["x"], 1, DBL),
        f("pow", &["x", "y"], 2, NUM),
        f("rand", &[], 0, INT),
        f("srand", &["seed"], 1, NULL),
        f("isnan", &["x"], 1, BOOL),
    ],
    constants: &[],
    object_types: &[],
};

const FS_FILE: SigType = SigType::Resource("fs.file");
const FS_DIR: SigType = SigType::Resource("fs.dir");
const FS_PROC: SigType = SigType::Resource("fs.proc");

static FS: BuiltinModule = BuiltinModule {
    name: "fs",
    functions: &[
        f("open", &["path", "mode", "perm"], 1, &[FS_FILE, Null]),
        f("fdopen", &["fd", "mode"], 1, &[FS_FILE, Null]),
        f("opendir", &["path"], 1, &[FS_DIR, Null]),
        f("popen", &["command", "mode"], 1, &[FS_PROC, Null]),
        f("mkstemp", &["template"], 0, &[FS_FILE, Null]),
        f("readlink", &["path"], 1, STR_OR_NULL),
        f("stat", &["path"], 1, OBJ_OR_NULL),
        f("lstat", &["path"], 1, OBJ_OR_NULL),
        f("mkdir", &["path", "mode"], 1, BOOL_OR_NULL),
        f("rmdir", &["path"], 1, BOOL_OR_NULL),
        f("symlink", &["target", "path"], 2, BOOL_OR_NULL),
        f("unlink", &["path"], 1, BOOL_OR_NULL),
        f("getcwd", &[], 0, STR_OR_NULL),
        f("chdir", &["path"], 1, BOOL_OR_NULL),
        f("chmod", &["path", "mode"], 2, BOOL_OR_NULL),
        f("chown", &["path", "uid", "gid"], 1, BOOL_OR_NULL),
        f("rename", &["oldpath", "newpath"], 2, BOOL_OR_NULL),
        f("glob", &["...patterns"], 0, ARR_OR_NULL),
        f("dirname", &["path"], 1, STR_OR_NULL),
        f("basename", &["path"], 1, STR_OR_NULL),
        f("lsdir", &["path", "pattern"], 1, ARR_OR_NULL),
        f("access", &["path", "mode"], 1, BOOL_OR_NULL),
        f("readfile", &["path", "limit"], 1, STR_OR_NULL),
        f("writefile", &["path", "data", "limit"], 2, INT_OR_NULL),
        f("realpath", &["path"], 1, STR_OR_NULL),
        f("pipe", &[], 0, ARR_OR_NULL),
        f("error", &[], 0, STR_OR_NULL),
    ],
    constants: &[
        c("stdin", FS_FILE),
        c("stdout", FS_FILE),
        c("stderr", FS_FILE),
    ],
    object_types: &[
        ObjectType {
            tag: "fs.file",
            methods: &[
                f("read", &["length"], 1, STR_OR_NULL),
                f("write", &["data"], 1, INT_OR_NULL),
                f("seek", &["offset", "whence"], 0, BOOL_OR_NULL),
                f("tell", &[], 0, INT_OR_NULL),
                f("close", &[], 0, BOOL_OR_NULL),
                f("flush", &[], 0, BOOL_OR_NULL),
                f("fileno", &[], 0, INT_OR_NULL),
                f("isatty", &[], 0, BOOL),
                f("truncate", &["offset"], 0, BOOL_OR_NULL),
                f("lock", &["op"], 0, BOOL_OR_NULL),
                f("error", &[], 0, STR_OR_NULL),
            ],
        },
        ObjectType {
            tag: "fs.dir",
            methods: &[
                f("read", &[], 0, STR_OR_NULL),
                f("tell", &[], 0, INT_OR_NULL),
                f("seek", &["offset"], 1, BOOL_OR_NULL),
                f("close", &[], 0, BOOL_OR_NULL),
                f("fileno", &[], 0, INT_OR_NULL),
                f("error", &[], 0, STR_OR_NULL),
            ],
        },
        ObjectType {
            tag: "fs.proc",
            methods: &[
                f("read", &["length"], 1, STR_OR_NULL),
                f("write", &["data"], 1, INT_OR_NULL),
                f("close", &[], 0, INT_OR_NULL),
                f("flush", &[], 0, BOOL_OR_NULL),
                f("fileno", &[], 0, INT_OR_NULL),
                f("error", &[], 0, STR_OR_NULL),
            ],
        },
    ],
};

static DIGEST: BuiltinModule = BuiltinModule {
    name: "digest",
    functions: &[
        f("md5", &["str"], 1, STR_OR_NULL),
        f("sha1", &["str"], 1, STR_OR_NULL),
        f("sha256", &["str"], 1, STR_OR_NULL),
        f("sha384", &["str"], 1, STR_OR_NULL),
        f("sha512", &["str"], 1, STR_OR_NULL),
        f("md5_file", &["path"], 1, STR_OR_NULL),
        f("sha1_file", &["path"], 1, STR_OR_NULL),
        f("sha256_file", &["path"], 1, STR_OR_NULL),
        f("sha384_file", &["path"], 1, STR_OR_NULL),
        f("sha512_file", &["path"], 1, STR_OR_NULL),
    ],
    constants: &[],
    object_types: &[],
};

static LOG: BuiltinModule = BuiltinModule {
    name: "log",
    functions: &[
        f("openlog", &["ident", "options", "facility"], 0, BOOL),
        f("syslog", &["priority", "format", "...args"], 2, BOOL),
        f("closelog", &[], 0, NULL),
        f("ulog_open", &["channels", "facility", "ident"], 0, BOOL),
        f("ulog", &["priority", "format", "...args"], 2, BOOL),
        f("ulog_close", &[], 0, NULL),
        f("ulog_threshold", &["priority"], 0, BOOL),
        f("INFO", &["format", "...args"], 1, BOOL),
        f("NOTE", &["format", "...args"], 1, BOOL),
        f("WARN", &["format", "...args"], 1, BOOL),
        f("ERR", &["format", "...args"], 1, BOOL),
    ],
    constants: &[
        c("LOG_PID", Int),
        c("LOG_CONS", Int),
        c("LOG_NDELAY", Int),
        c("LOG_ODELAY", Int),
        c("LOG_NOWAIT", Int),
        c("LOG_AUTH", Int),
        c("LOG_DAEMON", Int),
        c("LOG_USER", Int),
        c("LOG_LOCAL0", Int),
        c("LOG_EMERG", Int),
        c("LOG_ALERT", Int),
        c("LOG_CRIT", Int),
        c("LOG_ERR", Int),
        c("LOG_WARNING", Int),
        c("LOG_NOTICE", Int),
        c("LOG_INFO", Int),
        c("LOG_DEBUG", Int),
        c("ULOG_KMSG", Int),
        c("ULOG_SYSLOG", Int),
        c("ULOG_STDIO", Int),
    ],
    object_types: &[],
};

const SOCKET_HANDLE: SigType = SigType::Resource("socket.socket");

static SOCKET: BuiltinModule = BuiltinModule {
    name: "socket",
    functions: &[
        f("create", &["domain", "type", "protocol"], 0, &[SOCKET_HANDLE, Null]),
        f("connect", &["host", "service", "hints", "timeout"], 1, &[SOCKET_HANDLE, Null]),
        f("listen", &["host", "service", "hints", "backlog"], 1, &[SOCKET_HANDLE, Null]),
        f("open", &["fd"], 1, &[SOCKET_HANDLE, Null]),
        f("pair", &["type"], 0, ARR_OR_NULL),
        f("sockaddr", &["address"], 1, OBJ_OR_NULL),
        f("nameinfo", &["address", "flags"], 1, OBJ_OR_NULL),
        f("addrinfo", &["hostname", "service", "hints"], 1, ARR_OR_NULL),
        f("poll", &["timeout", "...sockets"], 1, ARR_OR_NULL),
        f("error", &["numeric"], 0, &[Str, Int, Null]),
        f("strerror", &["code"], 1, STR_OR_NULL),
    ],
    constants: &[
        c("AF_INET", Int),
        c("AF_INET6", Int),
        c("AF_UNIX", Int),
        c("AF_UNSPEC", Int),
        c("SOCK_STREAM", Int),
        c("SOCK_DGRAM", Int),
        c("SOCK_RAW", Int),
        c("SOCK_NONBLOCK", Int),
        c("SOCK_CLOEXEC", Int),
        c("IPPROTO_TCP", Int),
        c("IPPROTO_UDP", Int),
        c("SOL_SOCKET", Int),
        c("SO_REUSEADDR", Int),
        c("SO_KEEPALIVE", Int),
        c("POLLIN", Int),
        c("POLLOUT", Int),
        c("POLLERR", Int),
        c("POLLHUP", Int),
        c("MSG_DONTWAIT", Int),
        c("MSG_PEEK", Int),
    ],
    object_types: &[ObjectType {
        tag: "socket.socket",
        methods: &[
            f("connect", &["address", "port"], 1, BOOL_OR_NULL),
            f("bind", &["address", "port"], 1, BOOL_OR_NULL),
            f("listen", &["backlog"], 0, BOOL_OR_NULL),
            f("accept", &["address", "flags"], 0, &[SOCKET_HANDLE, Null]),
            f("send", &["data", "flags", "address"], 1, INT_OR_NULL),
            f("recv", &["length", "flags", "address"], 0, STR_OR_NULL),
            f("setopt", &["level", "option", "value"], 3, BOOL_OR_NULL),
            f("getopt", &["level", "option"], 2, ANY),
            f("fileno", &[], 0, INT),
            f("peername", &[], 0, OBJ_OR_NULL),
            f("sockname", &[], 0, OBJ_OR_NULL),
            f("shutdown", &["how"], 1, BOOL_OR_NULL),
            f("close", &[], 0, BOOL_OR_NULL),
            f("error", &["numeric"], 0, &[Str, Int, Null]),
        ],
    }],
};

static STRUCT: BuiltinModule = BuiltinModule {
    name: "struct",
    functions: &[
        f("pack", &["format", "...values"], 1, STR_OR_NULL),
        f("unpack", &["format", "input", "offset"], 2, ARR_OR_NULL),
        f("new", &["format"], 1, &[SigType::Resource("struct.format"), Null]),
        f("buffer", &["data"], 0, &[SigType::Resource("struct.buffer"), Null]),
    ],
    constants: &[],
    object_types: &[
        ObjectType {
            tag: "struct.format",
            methods: &[
                f("pack", &["...values"], 0, STR_OR_NULL),
                f("unpack", &["input", "offset"], 1, ARR_OR_NULL),
            ],
        },
        ObjectType {
            tag: "struct.buffer",
            methods: &[
                f("pos", &["offset"], 0, ANY),
                f("length", &[], 0, INT),
                f("put", &["format", "...values"], 1, ANY),
                f("get", &["format"], 1, ANY),
                f("slice", &["start", "end"], 0, STR_OR_NULL),
                f("pull", &[], 0, STR_OR_NULL),
            ],
        },
    ],
};

const UBUS_CONNECTION: SigType = SigType::Resource("ubus.connection");

static UBUS: BuiltinModule = BuiltinModule {
    name: "ubus",
    functions: &[
        f("connect", &["socket", "timeout"], 0, &[UBUS_CONNECTION, Null]),
        f("error", &["numeric"], 0, &[Str, Int, Null]),
    ],
    constants: &[
        c("STATUS_OK", Int),
        c("STATUS_INVALID_COMMAND", Int),
        c("STATUS_INVALID_ARGUMENT", Int),
        c("STATUS_METHOD_NOT_FOUND", Int),
        c("STATUS_NOT_FOUND", Int),
        c("STATUS_NO_DATA", Int),
        c("STATUS_PERMISSION_DENIED", Int),
        c("STATUS_TIMEOUT", Int),
        c("STATUS_NOT_SUPPORTED", Int),
        c("STATUS_UNKNOWN_ERROR", Int),
        c("STATUS_CONNECTION_FAILED", Int),
    ],
    object_types: &[
        ObjectType {
            tag: "ubus.connection",
            methods: &[
                f("list", &["path"], 0, ARR_OR_NULL),
                f("call", &["object", "method", "data", "callback"], 2, ANY),
                f("publish", &["object", "methods"], 1, &[SigType::Resource("ubus.object"), Null]),
                f("listener", &["pattern", "callback"], 2, &[SigType::Resource("ubus.listener"), Null]),
                f("subscriber", &["notify", "remove"], 0, &[SigType::Resource("ubus.subscriber"), Null]),
                f("event", &["event", "data"], 1, BOOL_OR_NULL),
                f("error", &["numeric"], 0, &[Str, Int, Null]),
                f("disconnect", &[], 0, BOOL),
            ],
        },
        ObjectType {
            tag: "ubus.object",
            methods: &[
                f("notify", &["type", "data", "callback"], 1, ANY),
                f("subscribed", &[], 0, BOOL),
                f("remove", &[], 0, BOOL_OR_NULL),
            ],
        },
        ObjectType {
            tag: "ubus.listener",
            methods: &[f("remove", &[], 0, BOOL_OR_NULL)],
        },
        ObjectType {
            tag: "ubus.subscriber",
            methods: &[
                f("subscribe", &["object"], 1, BOOL_OR_NULL),
                f("unsubscribe", &["object"], 1, BOOL_OR_NULL),
                f("remove", &[], 0, BOOL_OR_NULL),
            ],
        },
    ],
};

static UCI: BuiltinModule = BuiltinModule {
    name: "uci",
    functions: &[
        f(
            "cursor",
            &["config_dir", "delta_dir", "config2_dir", "flags"],
            0,
            &[SigType::Resource("uci.cursor"), Null],
        ),
        f("error", &[], 0, STR_OR_NULL),
    ],
    constants: &[],
    object_types: &[ObjectType {
        tag: "uci.cursor",
        methods: &[
            f("load", &["config"], 1, BOOL_OR_NULL),
            f("unload", &["config"], 1, BOOL_OR_NULL),
            f("get", &["config", "section", "option"], 2, ANY),
            f("get_all", &["config", "section"], 1, OBJ_OR_NULL),
            f("get_first", &["config", "type", "option"], 2, ANY),
            f("add", &["config", "type"], 2, STR_OR_NULL),
            f("set", &["config", "section", "option", "value"], 3, BOOL_OR_NULL),
            f("rename", &["config", "section", "option", "name"], 3, BOOL_OR_NULL),
            f("save", &["config"], 0, BOOL_OR_NULL),
            f("delete", &["config", "section", "option"], 2, BOOL_OR_NULL),
            f("list_append", &["config", "section", "option", "value"], 4, BOOL_OR_NULL),
            f("list_remove", &["config", "section", "option", "value"], 4, BOOL_OR_NULL),
            f("reorder", &["config", "section", "index"], 3, BOOL_OR_NULL),
            f("commit", &["config"], 0, BOOL_OR_NULL),
            f("revert", &["config"], 0, BOOL_OR_NULL),
            f("changes", &["config"], 0, OBJ_OR_NULL),
            f("foreach", &["config", "type", "callback"], 3, BOOL_OR_NULL),
            f("configs", &[], 0, ARR_OR_NULL),
            f("error", &[], 0, STR_OR_NULL),
        ],
    }],
};

static ULOOP: BuiltinModule = BuiltinModule {
    name: "uloop",
    functions: &[
        f("init", &[], 0, BOOL_OR_NULL),
        f("run", &["timeout"], 0, INT_OR_NULL),
        f("end", &[], 0, NULL),
        f("done", &[], 0, BOOL),
        f("timer", &["timeout", "callback"], 0, &[SigType::Resource("uloop.timer"), Null]),
        f("handle", &["handle", "callback", "events"], 3, &[SigType::Resource("uloop.handle"), Null]),
        f(
            "process",
            &["executable", "args", "env", "callback"],
            4,
            &[SigType::Resource("uloop.process"), Null],
        ),
        f("task", &["func", "output_cb", "input_cb"], 1, &[SigType::Resource("uloop.task"), Null]),
        f("interval", &["timeout", "callback"], 2, &[SigType::Resource("uloop.interval"), Null]),
        f("signal", &["signal", "callback"], 2, &[SigType::Resource("uloop.signal"), Null]),
        f("cancelling", &[], 0, BOOL),
        f("running", &[], 0, BOOL),
        f("error", &[], 0, STR_OR_NULL),
    ],
    constants: &[
        c("ULOOP_READ", Int),
        c("ULOOP_WRITE", Int),
        c("ULOOP_EDGE_TRIGGER", Int),
        c("ULOOP_BLOCKING", Int),
    ],
    object_types: &[
        ObjectType {
            tag: "uloop.timer",
            methods: &[
                f("set", &["timeout"], 0, BOOL),
                f("remaining", &[], 0, INT),
                f("cancel", &[], 0, BOOL),
            ],
        },
        ObjectType {
            tag: "uloop.handle",
            methods: &[
                f("fileno", &[], 0, INT),
                f("handle", &[], 0, ANY),
                f("delete", &[], 0, NULL),
            ],
        },
        ObjectType {
            tag: "uloop.process",
            methods: &[f("pid", &[], 0, INT), f("delete", &[], 0, BOOL)],
        },
        ObjectType {
            tag: "uloop.task",
            methods: &[
                f("pid", &[], 0, INT),
                f("kill", &[], 0, BOOL),
                f("finished", &[], 0, BOOL),
            ],
        },
        ObjectType {
            tag: "uloop.interval",
            methods: &[
                f("set", &["timeout"], 0, BOOL),
                f("remaining", &[], 0, INT),
                f("expirations", &[], 0, INT),
                f("cancel", &[], 0, BOOL),
            ],
        },
        ObjectType {
            tag: "uloop.signal",
            methods: &[f("signo", &[], 0, INT), f("delete", &[], 0, BOOL)],
        },
    ],
};

static ZLIB: BuiltinModule = BuiltinModule {
    name: "zlib",
    functions: &[
        f("deflate", &["data", "gzip", "level"], 1, STR_OR_NULL),
        f("inflate", &["data"], 1, STR_OR_NULL),
    ],
    constants: &[
        c("Z_NO_COMPRESSION", Int),
        c("Z_BEST_SPEED", Int),
        c("Z_BEST_COMPRESSION", Int),
        c("Z_DEFAULT_COMPRESSION", Int),
    ],
    object_types: &[],
};

static NL80211: BuiltinModule = BuiltinModule {
    name: "nl80211",
    functions: &[
        f("request", &["cmd", "flags", "payload"], 1, ANY),
        f("waitfor", &["cmds", "timeout"], 1, OBJ_OR_NULL),
        f("listener", &["callback", "cmds"], 2, &[SigType::Resource("nl80211.listener"), Null]),
        f("error", &[], 0, STR_OR_NULL),
    ],
    constants: &[c("const", Obj)],
    object_types: &[ObjectType {
        tag: "nl80211.listener",
        methods: &[f("set_commands", &["cmds"], 1, BOOL), f("close", &[], 0, BOOL)],
    }],
};

static RTNL: BuiltinModule = BuiltinModule {
    name: "rtnl",
    functions: &[
        f("request", &["cmd", "flags", "payload"], 1, ANY),
        f("listener", &["callback", "cmds", "groups"], 1, &[SigType::Resource("rtnl.listener"), Null]),
        f("error", &[], 0, STR_OR_NULL),
    ],
    constants: &[c("const", Obj)],
    object_types: &[ObjectType {
        tag: "rtnl.listener",
        methods: &[f("set_commands", &["cmds"], 1, BOOL), f("close", &[], 0, BOOL)],
    }],
};

static RESOLV: BuiltinModule = BuiltinModule {
    name: "resolv",
    functions: &[
        f("query", &["names", "options"], 1, OBJ_OR_NULL),
        f("error", &[], 0, STR_OR_NULL),
    ],
    constants: &[],
    object_types: &[],
};

static GLOBALS: phf::Map<&'static str, FunctionSignature> = phf::phf_map! {
    "print" => f("print", &["...values"], 0, INT),
    "printf" => f("printf", &["format", "...args"], 1, INT),
    "sprintf" => f("sprintf", &["format", "...args"], 1, STR),
    "warn" => f("warn", &["...values"], 0, INT),
    "length" => f("length", &["value"], 1, INT_OR_NULL),
    "keys" => f("keys", &["object"], 1, ARR_OR_NULL),
    "values" => f("values", &["object"], 1, ARR_OR_NULL),
    "exists" => f("exists", &["object", "key"], 2, BOOL),
    "push" => f("push", &["array", "...values"], 1, ANY),
    "pop" => f("pop", &["array"], 1, ANY),
    "shift" => f("shift", &["array"], 1, ANY),
    "unshift" => f("unshift", &["array", "...values"], 1, ANY),
    "splice" => f("splice", &["array", "offset", "length", "...values"], 2, ANY),
    "slice" => f("slice", &["array", "start", "end"], 1, ARR_OR_NULL),
    "join" => f("join", &["separator", "array"], 2, STR_OR_NULL),
    "split" => f("split", &["string", "separator", "limit"], 2, ARR_OR_NULL),
    "filter" => f("filter", &["array", "callback"], 2, ARR_OR_NULL),
    "map" => f("map", &["array", "callback"], 2, ARR_OR_NULL),
    "sort" => f("sort", &["array", "callback"], 1, ARR_OR_NULL),
    "reverse" => f("reverse", &["value"], 1, &[Arr, Str, Null]),
    "uniq" => f("uniq", &["array"], 1, ARR_OR_NULL),
    "min" => f("min", &["...values"], 0, ANY),
    "max" => f("max", &["...values"], 0, ANY),
    "index" => f("index", &["haystack", "needle"], 2, INT_OR_NULL),
    "rindex" => f("rindex", &["haystack", "needle"], 2, INT_OR_NULL),
    "substr" => f("substr", &["string", "offset", "length"], 2, STR),
    "match" => f("match", &["string", "pattern"], 2, ARR_OR_NULL),
    "replace" => f("replace", &["string", "pattern", "replacement", "limit"], 3, STR),
    "uc" => f("uc", &["string"], 1, STR_OR_NULL),
    "lc" => f("lc", &["string"], 1, STR_OR_NULL),
    "trim" => f("trim", &["string", "chars"], 1, STR),
    "ltrim" => f("ltrim", &["string", "chars"], 1, STR),
    "rtrim" => f("rtrim", &["string", "chars"], 1, STR),
    "chr" => f("chr", &["...codes"], 0, STR),
    "ord" => f("ord", &["string", "offset"], 1, INT_OR_NULL),
    "type" => f("type", &["value"], 1, STR_OR_NULL),
    "int" => f("int", &["value", "base"], 1, INT),
    "hex" => f("hex", &["string"], 1, INT),
    "json" => f("json", &["value"], 1, ANY),
    "b64enc" => f("b64enc", &["string"], 1, STR_OR_NULL),
    "b64dec" => f("b64dec", &["string"], 1, STR_OR_NULL),
    "hexenc" => f("hexenc", &["string"], 1, STR_OR_NULL),
    "hexdec" => f("hexdec", &["string", "skipchars"], 1, STR_OR_NULL),
    "iptoarr" => f("iptoarr", &["address"], 1, ARR_OR_NULL),
    "arrtoip" => f("arrtoip", &["array"], 1, STR_OR_NULL),
    "regexp" => f("regexp", &["source", "flags"], 1, &[Re]),
    "wildcard" => f("wildcard", &["subject", "pattern", "nocase"], 2, BOOL),
    "time" => f("time", &[], 0, INT),
    "localtime" => f("localtime", &["epoch"], 0, &[Obj]),
    "gmtime" => f("gmtime", &["epoch"], 0, &[Obj]),
    "timelocal" => f("timelocal", &["datetime"], 1, INT_OR_NULL),
    "timegm" => f("timegm", &["datetime"], 1, INT_OR_NULL),
    "clock" => f("clock", &["monotonic"], 0, ARR_OR_NULL),
    "sleep" => f("sleep", &["milliseconds"], 1, BOOL),
    "system" => f("system", &["command", "timeout"], 1, INT_OR_NULL),
    "getenv" => f("getenv", &["name"], 0, &[Str, Obj, Null]),
    "die" => f("die", &["message"], 0, NULL),
    "exit" => f("exit", &["code"], 0, NULL),
    "assert" => f("assert", &["condition", "message"], 1, ANY),
    "require" => f("require", &["name"], 1, ANY),
    "include" => f("include", &["path", "scope"], 1, NULL),
    "render" => f("render", &["template", "...args"], 1, STR),
    "loadstring" => f("loadstring", &["code", "options"], 1, &[Func]),
    "loadfile" => f("loadfile", &["path", "options"], 1, &[Func]),
    "call" => f("call", &["func", "ctx", "scope", "...args"], 1, ANY),
    "signal" => f("signal", &["signal", "handler"], 1, ANY),
    "sourcepath" => f("sourcepath", &["depth", "dironly"], 0, STR_OR_NULL),
    "proto" => f("proto", &["value", "prototype"], 1, ANY),
    "gc" => f("gc", &["operation", "argument"], 0, ANY),
};

static GLOBAL_CONSTANTS: phf::Map<&'static str, Constant> = phf::phf_map! {
    "global" => c("global", Obj),
    "ARGV" => c("ARGV", Arr),
    "NaN" => c("NaN", Dbl),
    "Infinity" => c("Infinity", Dbl),
    "REQUIRE_SEARCH_PATH" => c("REQUIRE_SEARCH_PATH", Arr),
};

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_registry_lookup() {
        let math = lookup("math").unwrap();
        assert!(math.is_valid_import("abs"));
        assert!(math.is_valid_import("sin"));
        assert!(!math.is_valid_import("invalidFunction"));
        assert!(lookup("nonexistent").is_none());

        let fs = lookup("fs").unwrap();
        assert!(fs.function("open").is_some());
        assert!(fs.function("read").is_none());
        assert!(fs.is_valid_import("stdout"));
        assert_eq!(fs.object_type_with_method("read").map(|o| o.tag), Some("fs.file"));
    }

    #[test]
    fn test_every_module_is_registered_under_its_name() {
        for (name, module) in &MODULES {
            assert_eq!(*name, module.name);
            for object in module.object_types() {
                assert!(object.tag.starts_with(&format!("{name}.")), "{}", object.tag);
            }
        }
    }

    #[test]
    fn test_method_lookup() {
        assert_eq!(method("fs.file", "read").map(|m| m.name), Some("read"));
        assert!(method("fs.file", "readdir").is_none());
        assert!(method("uci.cursor", "get_all").is_some());
        assert!(method("bogus", "read").is_none());
    }

    #[test]
    fn test_globals() {
        assert_eq!(global("length").map(|f| f.required), Some(1));
        assert!(global("nope").is_none());
        assert!(global_constant("ARGV").is_some());
        assert!(global_names().any(|name| name == "sprintf"));
    }

    #[test]
    fn test_module_path() {
        assert_eq!(module_path("./lib"), Some("./lib.uc".into()));
        assert_eq!(module_path("../x.uc"), Some("../x.uc".into()));
        assert_eq!(module_path("/usr/share/ucode/y"), Some("/usr/share/ucode/y.uc".into()));
        assert_eq!(module_path("fs"), None);
        assert_eq!(module_path("luci.http"), None);
    }

    #[test]
    fn test_disk_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("helper.uc"), "export const x = 1;").unwrap();
        let loader = DiskLoader::new(dir.path());
        assert!(loader.exists(Path::new("./helper.uc")));
        assert!(!loader.exists(Path::new("./missing.uc")));
        assert!(loader.exists(&dir.path().join("helper.uc")));
    }
}
