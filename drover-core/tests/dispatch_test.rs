mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pretty_assertions::assert_eq;

use common::RecordingSource;
use drover_core::{
    Command, CommandBuilder, Context, DispatchErrorKind, DispatchHooks, Dispatcher, EngineConfig,
    Error, Flag, Handler, OperandRelation, Outcome, Parameter, Reply, SearchError, TypeRegistry,
};

fn greet_handler() -> Handler {
    Arc::new(|ctx: &Context| {
        let name = ctx
            .value("name")
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default();
        let mut message = format!("Hello, {}", name);
        if ctx.flag_present("loud") {
            message.make_ascii_uppercase();
            message.push('!');
        }
        Some(Reply::Str(message))
    })
}

fn greet_command(registry: &TypeRegistry) -> Command {
    CommandBuilder::new("greet")
        .description("Greets someone")
        .parameter(Parameter::new("name").required().accept(registry.get("string").unwrap()))
        .flag(Flag::new("loud"))
        .handler(greet_handler())
        .build()
        .unwrap()
}

fn user_command(registry: &TypeRegistry) -> Command {
    let add = CommandBuilder::new("add")
        .parameter(Parameter::new("name").required().accept(registry.get("string").unwrap()))
        .handler(Arc::new(|ctx: &Context| {
            ctx.value("name").map(|v| Reply::Str(v.to_string()))
        }))
        .build()
        .unwrap();
    let list = CommandBuilder::new("list")
        .handler(Arc::new(|_ctx| Some(Reply::Int(0))))
        .build()
        .unwrap();
    CommandBuilder::new("user").child(add).child(list).build().unwrap()
}

fn engine() -> Dispatcher {
    let registry = TypeRegistry::standard();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(greet_command(&registry)).unwrap();
    dispatcher.register(user_command(&registry)).unwrap();
    dispatcher
}

fn error_kind(outcome: &Outcome) -> DispatchErrorKind {
    match outcome {
        Outcome::Error(error) => error.kind,
        other => panic!("expected an error outcome, got {:?}", other),
    }
}

#[test]
fn dispatches_with_bound_parameter_and_flag() {
    // scenario: greet Alice --loud
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet Alice --loud").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Str("HELLO, ALICE!".to_string()))));
    assert!(source.errors.borrow().is_empty());
}

#[test]
fn missing_argument_never_reaches_the_handler() {
    let registry = TypeRegistry::standard();
    let invoked = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&invoked);
    let command = CommandBuilder::new("greet")
        .parameter(Parameter::new("name").required().accept(registry.get("string").unwrap()))
        .handler(Arc::new(move |_ctx: &Context| {
            seen.store(true, Ordering::SeqCst);
            None
        }))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(command).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::NotEnoughArgs);
    assert!(!invoked.load(Ordering::SeqCst));
    assert_eq!(source.errors.borrow().len(), 1);
}

#[test]
fn presence_only_flag_rejects_a_value() {
    // scenario: greet Alice --loud=x
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet Alice --loud=x").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::FlagDoesNotAcceptValue);
}

#[test]
fn unwanted_flag_values_can_be_tolerated() {
    let registry = TypeRegistry::standard();
    let config = EngineConfig {
        ignore_unwanted_flag_values: true,
        ..EngineConfig::default()
    };
    let mut dispatcher = Dispatcher::new(config);
    dispatcher.register(greet_command(&registry)).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet Alice --loud=x").unwrap();
    assert!(outcome.succeeded());
}

#[test]
fn resolves_through_a_parent_to_a_child() {
    // scenario: user add Bob
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "user add Bob").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Str("Bob".to_string()))));
}

#[test]
fn resolution_is_case_insensitive() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "USER Add Bob").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Str("Bob".to_string()))));
}

#[test]
fn parent_without_handler_requires_a_sub_command() {
    // scenario: user
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "user").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::CommandRequiresSub);
}

#[test]
fn parent_with_handler_consumes_unrecognized_input() {
    let registry = TypeRegistry::standard();
    let set = CommandBuilder::new("set")
        .handler(Arc::new(|_ctx| Some(Reply::Code(1))))
        .build()
        .unwrap();
    let config_cmd = CommandBuilder::new("config")
        .parameter(Parameter::new("section").accept(registry.get("string").unwrap()))
        .child(set)
        .handler(Arc::new(|ctx: &Context| {
            ctx.value("section").map(|v| Reply::Str(v.to_string()))
        }))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(config_cmd).unwrap();

    let source = RecordingSource::new();
    // `general` is not a sub-command name, so `config` itself runs with it
    let outcome = dispatcher.dispatch(&source, "config general").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Str("general".to_string()))));

    let outcome = dispatcher.dispatch(&source, "config set").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Code(1))));
}

#[test]
fn first_token_must_be_a_plain_name() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "--greet Alice").unwrap();
    assert_eq!(outcome, Outcome::Search(SearchError::InvalidCommandName));

    let outcome = dispatcher.dispatch(&source, "").unwrap();
    assert_eq!(outcome, Outcome::Search(SearchError::InvalidCommandName));
}

#[test]
fn unknown_command_is_reported() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "shout Alice").unwrap();
    assert_eq!(outcome, Outcome::Search(SearchError::CommandNotFound));
    assert_eq!(source.last_error(), Some("unknown command `shout`".to_string()));
}

#[test]
fn line_breaks_are_rejected_up_front() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let error = dispatcher.dispatch(&source, "greet\nAlice").unwrap_err();
    assert!(matches!(error, Error::ForbiddenInput(_)));
}

#[test]
fn help_flag_intercepts_dispatch() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet --help").unwrap();
    assert_eq!(outcome, Outcome::HelpShown);
    let printed = source.printed.borrow();
    assert!(printed[0].starts_with("Usage: greet"));
}

#[test]
fn short_question_mark_reaches_help() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet -?").unwrap();
    assert_eq!(outcome, Outcome::HelpShown);
}

#[test]
fn command_help_flags_override_engine_defaults() {
    let registry = TypeRegistry::standard();
    let command = CommandBuilder::new("greet")
        .parameter(Parameter::new("name").required().accept(registry.get("string").unwrap()))
        .help_flags(&["usage"])
        .handler(greet_handler())
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(command).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet --usage").unwrap();
    assert_eq!(outcome, Outcome::HelpShown);
    // the engine-wide default no longer applies; `--help` binds as a
    // synthetic flag and the line is short an argument
    let outcome = dispatcher.dispatch(&source, "greet --help").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::NotEnoughArgs);
}

#[test]
fn requirement_gates_the_target() {
    let command = CommandBuilder::new("admin")
        .permission("admin.use")
        .handler(Arc::new(|_ctx| Some(Reply::Bool(true))))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(command).unwrap();

    let denied = RecordingSource::new();
    let outcome = dispatcher.dispatch(&denied, "admin").unwrap();
    assert_eq!(outcome, Outcome::RequirementNotMet);
    assert_eq!(denied.errors.borrow().len(), 1);

    let allowed = RecordingSource::with_permissions(&["admin.use"]);
    let outcome = dispatcher.dispatch(&allowed, "admin").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Bool(true))));
}

fn gated_tree(fallthrough: bool) -> Dispatcher {
    let add = CommandBuilder::new("add")
        .handler(Arc::new(|_ctx| Some(Reply::Bool(true))))
        .build()
        .unwrap();
    let user = CommandBuilder::new("user")
        .permission("user.base")
        .child(add)
        .build()
        .unwrap();
    let config = EngineConfig {
        source_requirement_fallthrough: fallthrough,
        ..EngineConfig::default()
    };
    let mut dispatcher = Dispatcher::new(config);
    dispatcher.register(user).unwrap();
    dispatcher
}

#[test]
fn ancestor_requirements_honor_the_fallthrough_setting() {
    let source = RecordingSource::new();

    let checking = gated_tree(true);
    let outcome = checking.dispatch(&source, "user add").unwrap();
    assert_eq!(outcome, Outcome::RequirementNotMet);

    let lenient = gated_tree(false);
    let outcome = lenient.dispatch(&source, "user add").unwrap();
    assert_eq!(outcome, Outcome::Dispatched(Some(Reply::Bool(true))));
}

#[test]
fn required_unless_wins_over_required_if() {
    let registry = TypeRegistry::standard();
    let command = CommandBuilder::new("sync")
        .flag(Flag::new("f").accept(registry.get("string").unwrap()).required_if(&["h"]).required_unless(&["g"]))
        .flag(Flag::new("g"))
        .flag(Flag::new("h"))
        .handler(Arc::new(|_ctx| None))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(command).unwrap();

    let source = RecordingSource::new();
    // both trigger flags present: `f` is not required
    let outcome = dispatcher.dispatch(&source, "sync -g -h").unwrap();
    assert!(outcome.succeeded());

    // only the required-if trigger: `f` must appear
    let outcome = dispatcher.dispatch(&source, "sync -h").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::MissingFlag);
}

#[test]
fn required_flag_bound_without_value_is_reported() {
    let registry = TypeRegistry::standard();
    let command = CommandBuilder::new("copy")
        .flag(Flag::new("dest").required().accept(registry.get("string").unwrap()))
        .handler(Arc::new(|_ctx| None))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(command).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "copy --dest").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::FlagMissingValue);
}

#[test]
fn unparseable_required_input_is_invalid() {
    let registry = TypeRegistry::standard();
    let command = CommandBuilder::new("sum")
        .parameter(Parameter::new("amount").required().accept(registry.get("int").unwrap()))
        .handler(Arc::new(|_ctx| None))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(command).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "sum twelve").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::InvalidInput);
}

#[test]
fn operand_ordering_is_enforced() {
    let registry = TypeRegistry::standard();
    let first = CommandBuilder::new("of")
        .operand_relation(OperandRelation::OperandsFirst)
        .parameter(Parameter::new("target").accept(registry.get("string").unwrap()))
        .flag(Flag::new("x"))
        .handler(Arc::new(|_ctx| None))
        .build()
        .unwrap();
    let last = CommandBuilder::new("ol")
        .operand_relation(OperandRelation::OperandsLast)
        .parameter(Parameter::new("target").accept(registry.get("string").unwrap()))
        .flag(Flag::new("x"))
        .handler(Arc::new(|_ctx| None))
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher.register(first).unwrap();
    dispatcher.register(last).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "of -x target").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::ParameterAfterFlag);
    assert!(dispatcher.dispatch(&source, "of target -x").unwrap().succeeded());

    let outcome = dispatcher.dispatch(&source, "ol target -x").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::FlagAfterParameter);
    assert!(dispatcher.dispatch(&source, "ol -x target").unwrap().succeeded());
}

struct CountingHooks {
    allow: bool,
    before: AtomicUsize,
    after: AtomicUsize,
}

impl CountingHooks {
    fn new(allow: bool) -> Arc<Self> {
        Arc::new(Self {
            allow,
            before: AtomicUsize::new(0),
            after: AtomicUsize::new(0),
        })
    }
}

impl DispatchHooks for CountingHooks {
    fn before_dispatch(&self, _ctx: &Context) -> bool {
        self.before.fetch_add(1, Ordering::SeqCst);
        self.allow
    }

    fn after_dispatch(&self, _ctx: &Context, _outcome: &Outcome) {
        self.after.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn veto_skips_handler_and_after_hook() {
    let registry = TypeRegistry::standard();
    let hooks = CountingHooks::new(false);
    let mut dispatcher =
        Dispatcher::new(EngineConfig::default()).with_hooks(Arc::clone(&hooks) as Arc<dyn DispatchHooks>);
    dispatcher.register(greet_command(&registry)).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "greet Alice").unwrap();
    assert_eq!(outcome, Outcome::NotDispatched);
    assert_eq!(hooks.before.load(Ordering::SeqCst), 1);
    assert_eq!(hooks.after.load(Ordering::SeqCst), 0);
}

#[test]
fn handler_panic_is_contained_and_after_hook_still_runs() {
    let hooks = CountingHooks::new(true);
    let command = CommandBuilder::new("boom")
        .handler(Arc::new(|_ctx: &Context| -> Option<Reply> { panic!("kaboom") }))
        .build()
        .unwrap();
    let mut dispatcher =
        Dispatcher::new(EngineConfig::default()).with_hooks(Arc::clone(&hooks) as Arc<dyn DispatchHooks>);
    dispatcher.register(command).unwrap();

    let source = RecordingSource::new();
    let outcome = dispatcher.dispatch(&source, "boom").unwrap();
    assert_eq!(error_kind(&outcome), DispatchErrorKind::ExceptionDuringDispatch);
    assert_eq!(hooks.after.load(Ordering::SeqCst), 1);
    assert_eq!(source.errors.borrow().len(), 1);
}

#[test]
fn word_lists_are_quoted_as_needed() {
    let dispatcher = engine();
    let source = RecordingSource::new();
    let outcome = dispatcher
        .dispatch_words(&source, &["greet", "Alice Smith", "--loud"])
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Dispatched(Some(Reply::Str("HELLO, ALICE SMITH!".to_string())))
    );
}

#[test]
fn duplicate_root_aliases_are_rejected() {
    let mut dispatcher = Dispatcher::new(EngineConfig::default());
    dispatcher
        .register(CommandBuilder::new("greet").handler(greet_handler()).build().unwrap())
        .unwrap();
    let error = dispatcher
        .register(
            CommandBuilder::new("hail")
                .alias("GREET")
                .handler(greet_handler())
                .build()
                .unwrap(),
        )
        .unwrap_err();
    assert!(matches!(error, drover_core::CommandBuildError::DuplicateAlias { .. }));
    // the rejected command was not kept
    assert_eq!(dispatcher.roots().len(), 1);
}
