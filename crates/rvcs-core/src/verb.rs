//! Uniform command surface shared by every backend.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Add,
    AddAll,
    Commit,
    Update,
    Push,
    Pull,
    Fetch,
    Init,
    Log,
    Status,
    List,
    Patch,
    Branch,
    Merge,
    Tag,
    Help,
    Back,
}

impl Verb {
    pub const ALL: [Verb; 17] = [
        Self::Add,
        Self::AddAll,
        Self::Commit,
        Self::Update,
        Self::Push,
        Self::Pull,
        Self::Fetch,
        Self::Init,
        Self::Log,
        Self::Status,
        Self::List,
        Self::Patch,
        Self::Branch,
        Self::Merge,
        Self::Tag,
        Self::Help,
        Self::Back,
    ];

    /// Wire name, also used as the prefix of error replies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddAll => "add_all",
            Self::Commit => "commit",
            Self::Update => "update",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Fetch => "fetch",
            Self::Init => "init",
            Self::Log => "log",
            Self::Status => "status",
            Self::List => "list",
            Self::Patch => "patch",
            Self::Branch => "branch",
            Self::Merge => "merge",
            Self::Tag => "tag",
            Self::Help => "help",
            Self::Back => "back",
        }
    }

    /// Argument synopsis and one-line description for help output.
    pub fn usage(self) -> (&'static str, &'static str) {
        match self {
            Self::Add => ("add [file1,file2,...]", "Add files to the staging area (default: everything)."),
            Self::AddAll => ("add_all", "Add all changes (Mercurial and SVN only)."),
            Self::Commit => ("commit [comment]", "Commit changes to the repository."),
            Self::Update => ("update", "Update the repository from its remote."),
            Self::Push => ("push", "Push changes to the remote repository."),
            Self::Pull => ("pull", "Pull remote changes."),
            Self::Fetch => ("fetch", "Fetch remote changes."),
            Self::Init => ("init [repository_name]", "Initialize a new repository (SVN: checkout URL)."),
            Self::Log => ("log", "View commit history."),
            Self::Status => ("status", "View repository status."),
            Self::List => ("list", "List branches (SVN: repository contents)."),
            Self::Patch => ("patch <patch_file>", "Apply a patch file."),
            Self::Branch => ("branch <name>", "Create a branch."),
            Self::Merge => ("merge <name>", "Merge a branch into the working copy."),
            Self::Tag => ("tag <name> [commit]", "Create a tag (commit target is Git only)."),
            Self::Help => ("help", "Display this help message."),
            Self::Back => ("back", "Return to the main menu."),
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init_repo" => Ok(Self::Init),
            other => Self::ALL
                .into_iter()
                .find(|v| v.as_str() == other)
                .ok_or_else(|| format!("unknown verb: {other}")),
        }
    }
}

/// Help text listing every verb.
pub fn help_text() -> String {
    let mut out = String::from("Available commands:\n");
    for verb in Verb::ALL {
        let (synopsis, description) = verb.usage();
        out.push_str(&format!("  - {synopsis}: {description}\n"));
    }
    out
}
