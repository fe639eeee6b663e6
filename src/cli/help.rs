//! Localized help text

const HELP_EN: &str = "\
Usage: frp [OPTIONS] <COMMAND>
Commands:
  tcp LOCAL[:REMOTE]            TCP port forwarding
  udp LOCAL[:REMOTE]            UDP port forwarding
  http|https LOCAL[:REMOTE]     HTTP/HTTPS forwarding
  set KEY=VALUE                 Set config (server=IP:PORT, token=XXX)
  save LOCAL[:REMOTE] --name NAME [--protocol P]  Save configuration
  config                        Show current configuration
  run CONFIG_NAME               Run saved configuration
  help [LANG]                   Show help (supported: zh-CN, ru)
Options:
  --frpc PATH                   Path to the frpc executable
  -v, --verbose                 More log output
";

const HELP_ZH_CN: &str = "\
用法: frp [选项] <命令>
命令:
  tcp 本地[:远程]               TCP端口映射
  udp 本地[:远程]               UDP端口映射
  http|https 本地[:远程]        HTTP/HTTPS映射
  set 键=值                     设置配置项 (server=IP:端口, token=XXX)
  save 本地[:远程] --name 名称 [--protocol 协议]  保存配置
  config                        显示当前配置
  run 配置名称                  运行已保存的配置
  help [语言]                   显示帮助 (支持zh-CN, ru)
选项:
  --frpc 路径                   frpc 可执行文件路径
  -v, --verbose                 输出更多日志
";

const HELP_RU: &str = "\
Использование: frp [ОПЦИИ] <КОМАНДА>
Команды:
  tcp ЛОКАЛЬНЫЙ[:УДАЛЕННЫЙ]         TCP проброс
  udp ЛОКАЛЬНЫЙ[:УДАЛЕННЫЙ]         UDP проброс
  http|https ЛОКАЛЬНЫЙ[:УДАЛЕННЫЙ]  HTTP/HTTPS проброс
  set КЛЮЧ=ЗНАЧЕНИЕ                 Настройки (server=IP:PORT, token=XXX)
  save ЛОКАЛЬ[:УДАЛЕН] --name ИМЯ [--protocol П]  Сохранить конфиг
  config                            Показать текущие настройки
  run ИМЯ_КОНФИГА                   Запустить сохраненную конфигурацию
  help [ЯЗЫК]                       Справка (поддерживается zh-CN, ru)
Опции:
  --frpc ПУТЬ                       Путь к исполняемому файлу frpc
  -v, --verbose                     Подробный вывод
";

/// Help text for `lang`, falling back to English
pub fn help_text(lang: Option<&str>) -> &'static str {
    match lang {
        Some("zh-CN") => HELP_ZH_CN,
        Some("ru") => HELP_RU,
        _ => HELP_EN,
    }
}
